use amur_isondo::ai::GameAI;
use amur_isondo::conversation::{ConversationEngine, SessionSnapshot};
use amur_isondo::credentials::CredentialStore;
use amur_isondo::error::AppError;
use amur_isondo::game_state::SessionConfig;
use amur_isondo::level::{LevelCatalog, LevelRecord};
use amur_isondo::message::OptionId;
use amur_isondo::persona::PersonaBuilder;
use amur_isondo::progression::ProgressionTracker;
use amur_isondo::save::{JsonProgressionStore, get_game_data_dir};
use amur_isondo::settings::Settings;
use amur_isondo::tags::{MAX_SELECTED_TAGS, PALETTE_SIZE, balanced_random_tags, random_question};
use amur_isondo::{logging, message::Message};
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Type a question, or A/B/C to ask a suggested one.
Commands: /undo  /new (new suggestions)  /clear  /next  /menu  /forget-key  /quit";

// What the player chose on the main menu.
enum Selection {
    Level(LevelRecord),
    Freeform(String),
    Quit,
}

// How a conversation ended.
enum Exit {
    Menu,
    Next(LevelRecord),
    Quit,
}

struct Game {
    credentials: Arc<CredentialStore>,
    engine: ConversationEngine,
    builder: PersonaBuilder,
    catalog: Arc<LevelCatalog>,
}

async fn ask(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn ensure_api_key(credentials: &CredentialStore, input: &mut Input) -> Result<bool> {
    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        if !key.trim().is_empty() {
            credentials.set(&key)?;
            return Ok(true);
        }
    }
    if credentials.load()?.is_some() {
        return Ok(true);
    }
    loop {
        match ask(input, "OpenRouter API key (kept for 30 days): ").await? {
            Some(key) if !key.is_empty() => {
                credentials.set(&key)?;
                return Ok(true);
            }
            Some(_) => println!("An API key is required to talk to the characters."),
            None => return Ok(false),
        }
    }
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        println!("\n{}: {}", message.sender.label(), message.text);
    }
}

fn print_options(snapshot: &SessionSnapshot) {
    if snapshot.options.is_empty() {
        return;
    }
    println!();
    for option in &snapshot.options {
        println!("  [{}] {}", option.id, option.text);
    }
}

fn report(error: &AppError) {
    match error {
        AppError::Config(_) => println!("! {} (set a key with /forget-key)", error),
        AppError::Cancelled => {}
        _ => println!("! {}", error),
    }
}

impl Game {
    async fn select(&self, input: &mut Input) -> Result<Selection> {
        let unlocked: Vec<LevelRecord> = {
            let tracker = self.engine.tracker().lock().await;
            println!("\n=== Records of Amur Isondo ===");
            for (index, level) in tracker.unlocked_levels().iter().enumerate() {
                let done = if tracker.is_completed(&level.id) { "*" } else { " " };
                println!(
                    "{:>3}.{} {} [{}, {}]",
                    index + 1,
                    done,
                    level.title,
                    level.category,
                    level.difficulty
                );
            }
            tracker.unlocked_levels().into_iter().cloned().collect()
        };
        println!("  f.  Freeform question\n  q.  Quit");

        loop {
            let Some(choice) = ask(input, "> ").await? else {
                return Ok(Selection::Quit);
            };
            match choice.as_str() {
                "q" | "/quit" => return Ok(Selection::Quit),
                "f" => return Ok(Selection::Freeform(random_question().to_string())),
                other => match other.parse::<usize>().ok().and_then(|n| unlocked.get(n.wrapping_sub(1))) {
                    Some(level) => return Ok(Selection::Level(level.clone())),
                    None => println!("Pick a level number, f or q."),
                },
            }
        }
    }

    async fn pick_tags(&self, input: &mut Input) -> Result<Option<Vec<String>>> {
        let mut palette = balanced_random_tags(PALETTE_SIZE);
        loop {
            println!("\nChoose up to {} traits (e.g. 1,4,7), r to reroll:", MAX_SELECTED_TAGS);
            for (index, tag) in palette.iter().enumerate() {
                print!("{:>3}. {:<22}", index + 1, tag);
                if index % 4 == 3 {
                    println!();
                }
            }
            println!();
            let Some(line) = ask(input, "> ").await? else {
                return Ok(None);
            };
            if line == "r" {
                palette = balanced_random_tags(PALETTE_SIZE);
                continue;
            }
            let tags: Vec<String> = line
                .split(',')
                .filter_map(|n| n.trim().parse::<usize>().ok())
                .filter_map(|n| palette.get(n.wrapping_sub(1)))
                .map(|tag| tag.to_string())
                .collect();
            if tags.is_empty() || tags.len() > MAX_SELECTED_TAGS {
                println!("Select between 1 and {} traits.", MAX_SELECTED_TAGS);
                continue;
            }
            return Ok(Some(tags));
        }
    }

    async fn start(&self, selection: &Selection, tags: &[String]) -> Result<(), AppError> {
        println!("\nSummoning your character...");
        let (config, level_id): (SessionConfig, Option<String>) = match selection {
            Selection::Level(level) => (
                self.builder.build(tags, level).await?,
                Some(level.id.clone()),
            ),
            Selection::Freeform(question) => (self.builder.build_freeform(tags, question).await?, None),
            Selection::Quit => return Ok(()),
        };
        println!("\nResearch question: {}", config.question);
        self.engine.load_session(config, level_id).await?;
        self.engine.initialize().await
    }

    async fn converse(&self, input: &mut Input) -> Result<Exit> {
        let snapshot = self.engine.snapshot().await;
        print_messages(&snapshot.messages);
        print_options(&snapshot);
        println!("\n{}", HELP);

        loop {
            let Some(line) = ask(input, "\nYou: ").await? else {
                return Ok(Exit::Quit);
            };
            let before = self.engine.snapshot().await.messages.len();

            let result = match line.as_str() {
                "" => continue,
                "/quit" => return Ok(Exit::Quit),
                "/menu" => return Ok(Exit::Menu),
                "/undo" => match self.engine.undo().await {
                    Ok(false) => {
                        println!("Nothing to undo.");
                        continue;
                    }
                    Ok(true) => {
                        println!("The last exchange fades from the records.");
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                "/new" => self.engine.regenerate_options().await.map(|_| ()),
                "/clear" => {
                    self.engine.clear().await;
                    self.engine.initialize().await
                }
                "/forget-key" => {
                    self.credentials.clear()?;
                    println!("API key forgotten.");
                    if !ensure_api_key(&self.credentials, input).await? {
                        return Ok(Exit::Quit);
                    }
                    continue;
                }
                "/next" => {
                    let snapshot = self.engine.snapshot().await;
                    let tracker = self.engine.tracker().lock().await;
                    let next = snapshot
                        .level_id
                        .as_deref()
                        .and_then(|id| tracker.next_level(id))
                        .filter(|next| tracker.is_unlocked(&next.id));
                    match next {
                        Some(next) => return Ok(Exit::Next(next.clone())),
                        None => {
                            println!("The next record is still sealed.");
                            continue;
                        }
                    }
                }
                text => {
                    let snapshot = self.engine.snapshot().await;
                    let question = OptionId::parse(text)
                        .and_then(|id| snapshot.options.iter().find(|o| o.id == id))
                        .map(|o| o.text.clone())
                        .unwrap_or_else(|| text.to_string());
                    match self.engine.submit_turn(&question).await {
                        Ok(outcome) => {
                            if outcome.newly_won {
                                let topic = snapshot
                                    .config
                                    .as_ref()
                                    .map(|c| c.target_topic.clone())
                                    .unwrap_or_default();
                                println!(
                                    "\n*** You've successfully learned about {}! Keep talking or type /next. ***",
                                    topic
                                );
                            }
                            if let Some(completion) = outcome.completion {
                                for id in completion.newly_unlocked {
                                    println!("*** New record unlocked: {} ***", id);
                                }
                            }
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
            };

            let snapshot = self.engine.snapshot().await;
            if let Err(e) = result {
                report(&e);
            }
            if snapshot.messages.len() > before {
                print_messages(&snapshot.messages[before..]);
            }
            print_options(&snapshot);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let data_dir = get_game_data_dir();
    let settings = Settings::load_from_dir(&data_dir).context("Failed to load settings")?;
    logging::init(&data_dir, settings.debug_mode).context("Failed to start logging")?;
    log::info!("Starting with model {}", settings.model);

    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    let credentials = Arc::new(CredentialStore::in_dir(&data_dir));
    if !ensure_api_key(&credentials, &mut input).await? {
        return Ok(());
    }

    let ai = Arc::new(GameAI::from_settings(&settings, credentials.clone())?);
    let catalog = Arc::new(LevelCatalog::builtin()?);
    let tracker = ProgressionTracker::load(
        catalog.clone(),
        Box::new(JsonProgressionStore::in_dir(&data_dir)),
    )?;
    let engine = ConversationEngine::new(ai.clone(), Arc::new(Mutex::new(tracker)))
        .with_elaboration(settings.elaborate_on_miss);

    let game = Game {
        credentials,
        engine,
        builder: PersonaBuilder::new(ai),
        catalog,
    };

    let mut selection = game.select(&mut input).await?;
    loop {
        if let Selection::Quit = selection {
            break;
        }
        let Some(tags) = game.pick_tags(&mut input).await? else {
            break;
        };
        if let Err(e) = game.start(&selection, &tags).await {
            report(&e);
            selection = game.select(&mut input).await?;
            continue;
        }

        selection = match game.converse(&mut input).await? {
            Exit::Quit => break,
            Exit::Menu => game.select(&mut input).await?,
            Exit::Next(level) => {
                println!("\n--- {} ---\n{}", level.title, level.description);
                match game.catalog.get(&level.id) {
                    Some(level) => Selection::Level(level.clone()),
                    None => game.select(&mut input).await?,
                }
            }
        };
        game.engine.reset().await;
    }

    println!("Farewell, traveller.");
    Ok(())
}
