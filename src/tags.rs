use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Most traits a player can pick for one persona.
pub const MAX_SELECTED_TAGS: usize = 5;

/// Size of the palette shown on the persona screen.
pub const PALETTE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TagCategory {
    #[strum(serialize = "Time period")]
    TimePeriod,
    Profession,
    #[strum(serialize = "Cultural origin")]
    CulturalOrigin,
    #[strum(serialize = "Social class")]
    SocialClass,
    Personality,
    #[strum(serialize = "Everyday object or animal")]
    ObjectOrAnimal,
    Mystical,
    #[strum(serialize = "Learning style")]
    LearningStyle,
}

impl TagCategory {
    // Pools are disjoint, so a balanced sample never repeats a tag.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            TagCategory::TimePeriod => &[
                "Stone Age", "Bronze Age", "Iron Age", "Classical Antiquity", "Ancient Period",
                "Medieval Era", "Dark Ages", "Renaissance", "Baroque Period", "Enlightenment",
                "Industrial Revolution", "1800s", "1850s", "1900s", "1920s", "1940s", "1960s",
                "1980s", "1990s", "Victorian Era", "Edwardian Era", "Belle Époque", "Gilded Age",
                "Jazz Age", "Cold War Era", "Information Age", "Modern Era", "Present Day",
                "Pre-Columbian", "Colonial Period", "Post-War Era", "Space Age", "Digital Age",
            ],
            TagCategory::Profession => &[
                "Warrior", "Scholar", "Merchant", "Artisan", "Blacksmith", "Farmer", "Hunter",
                "Fisher", "Scribe", "Librarian", "Teacher", "Healer", "Doctor", "Herbalist",
                "Midwife", "Sailor", "Captain", "Explorer", "Navigator", "Cartographer", "Trader",
                "Diplomat", "Guard", "Knight", "Samurai", "General", "Soldier", "Artist", "Painter",
                "Sculptor", "Musician", "Bard", "Storyteller", "Poet", "Inventor", "Engineer",
                "Architect", "Mason", "Carpenter", "Baker", "Brewer", "Cook", "Tailor", "Weaver",
                "Potter", "Jeweler", "Scientist", "Biologist", "Botanist", "Microbiologist",
                "Chemist", "Physicist", "Astronomer", "Geologist", "Archaeologist", "Historian",
                "Journalist", "Photographer", "Naturalist",
            ],
            TagCategory::CulturalOrigin => &[
                "Celtic", "Germanic", "Nordic", "Slavic", "Byzantine", "Frankish", "Saxon",
                "Egyptian", "Nubian", "Ethiopian", "Berber", "Moorish", "Greek", "Roman",
                "Etruscan", "Phoenician", "Persian", "Mesopotamian", "Babylonian", "Sumerian",
                "Chinese", "Japanese", "Korean", "Mongol", "Tibetan", "Indian", "Tamil", "Arabic",
                "Turkish", "Kurdish", "Aztec", "Mayan", "Incan", "Cherokee", "Iroquois", "Lakota",
                "Inuit", "Aboriginal", "Maori", "Polynesian", "Hawaiian", "Samoan", "Scythian",
            ],
            TagCategory::SocialClass => &[
                "Peasant", "Commoner", "Citizen", "Freeman", "Serf", "Merchant Class",
                "Artisan Class", "Middle Class", "Bourgeois", "Noble", "Aristocrat", "Patrician",
                "Gentry", "Courtier", "Royalty", "Emperor", "King", "Queen", "Prince", "Princess",
                "Duke", "Duchess", "Earl", "Count", "Baron", "Lord", "Lady", "Chieftain",
                "Tribal Leader", "Elder", "Clan Head", "Outcast", "Exile", "Refugee", "Nomad",
                "Wanderer",
            ],
            TagCategory::Personality => &[
                "Wise", "Cunning", "Brave", "Cowardly", "Honest", "Loyal", "Ambitious", "Humble",
                "Proud", "Modest", "Compassionate", "Kind", "Generous", "Greedy", "Patient",
                "Impulsive", "Calm", "Hot-tempered", "Peaceful", "Optimistic", "Pessimistic",
                "Cheerful", "Melancholic", "Serious", "Playful", "Scholarly", "Practical",
                "Idealistic", "Pragmatic", "Romantic", "Cynical", "Charismatic", "Shy",
                "Confident", "Stubborn", "Flexible",
            ],
            TagCategory::ObjectOrAnimal => &[
                "Cat", "Dog", "Horse", "Cow", "Goat", "Sheep", "Chicken", "Goose", "Rabbit",
                "Mouse", "Crow", "Eagle", "Owl", "Sparrow", "Salmon", "Whale", "Dolphin", "Bear",
                "Wolf", "Fox", "Deer", "Elephant", "Lion", "Tiger", "Turtle", "Frog", "Bee", "Ant",
                "Spider", "Book", "Scroll", "Letter", "Map", "Compass", "Clock", "Bell", "Mirror",
                "Candle", "Lamp", "Stone", "Pebble", "Clay", "Tree", "Flower", "Seed", "Bread",
                "Well", "River", "Mountain", "Garden", "Mill", "Bridge", "Road", "Gate", "Wagon",
                "Boat", "Ship", "Sword", "Shield", "Hammer", "Axe", "Pot", "Basket", "Rope",
            ],
            TagCategory::Mystical => &[
                "Spirit", "Ancestor Spirit", "Guardian Spirit", "Oracle", "Prophet", "Seer",
                "Shaman", "Wise Woman", "Medicine Man", "Dragon", "Phoenix", "Sphinx",
            ],
            TagCategory::LearningStyle => &[
                "Student", "Apprentice", "Master", "Tutor", "Mentor", "Guide", "Reader", "Writer",
                "Translator", "Interpreter", "Messenger", "Curious", "Observant", "Analytical",
                "Creative", "Logical", "Intuitive", "Quick Learner", "Memory Keeper",
                "Record Keeper", "Mathematician", "Surveyor", "Thinker", "Questioner", "Skeptic",
                "Dreamer", "Problem Solver", "Puzzle Maker", "Rule Follower", "Rule Breaker",
            ],
        }
    }

    pub fn all_pools() -> Vec<&'static [&'static str]> {
        TagCategory::iter().map(|c| c.tags()).collect()
    }
}

pub const EDUCATIONAL_QUESTIONS: &[&str] = &[
    "How do microorganisms affect human health and disease?",
    "What role do plants play in Earth's ecosystem?",
    "How do genetic mutations drive evolution?",
    "What causes different blood types in humans?",
    "How do vaccines work to prevent disease?",
    "What happens during photosynthesis?",
    "How do antibiotics fight bacterial infections?",
    "What makes viruses different from bacteria?",
    "Who was responsible for starting World War I?",
    "What were the main causes of World War II?",
    "How did the Black Death change European society?",
    "What led to the fall of the Roman Empire?",
    "Why did the American Civil War begin?",
    "What caused the French Revolution?",
    "How did the Industrial Revolution change daily life?",
    "What were the consequences of European colonization?",
    "How does gravity work?",
    "What makes atoms stick together?",
    "Why do some materials conduct electricity?",
    "How do magnets create magnetic fields?",
    "What causes different states of matter?",
    "How does nuclear energy work?",
    "What makes light behave like both a wave and particle?",
    "How do chemical reactions occur?",
    "What causes climate change?",
    "How do mountains form?",
    "Why do earthquakes happen?",
    "What creates ocean currents?",
    "How do rivers shape landscapes?",
    "What causes different weather patterns?",
    "How do ecosystems maintain balance?",
    "What factors determine regional climates?",
    "How did the printing press change society?",
    "What led to the development of computers?",
    "How do airplanes stay in the air?",
    "What makes the internet work?",
    "How did electricity transform civilization?",
    "What drove the space race?",
    "How do modern communications work?",
    "What innovations shaped the modern world?",
    "How do languages develop and change?",
    "What creates cultural differences between societies?",
    "How do economic systems work?",
    "What factors influence human behavior?",
    "How do societies organize themselves?",
    "What role does education play in civilization?",
    "How do laws and governments develop?",
    "What drives human migration patterns?",
];

/// Picks `count` items spread evenly over `pools`: each pool gives `count / pools.len()`,
/// the first `count % pools.len()` pools give one more, and the result is shuffled.
/// A pool smaller than its share gives everything it has.
pub fn balanced_sample<T: Copy, R: Rng + ?Sized>(pools: &[&[T]], count: usize, rng: &mut R) -> Vec<T> {
    if pools.is_empty() {
        return Vec::new();
    }
    let per_pool = count / pools.len();
    let remainder = count % pools.len();

    let mut picked = Vec::with_capacity(count);
    for (index, pool) in pools.iter().enumerate() {
        let share = per_pool + usize::from(index < remainder);
        let mut shuffled: Vec<T> = pool.to_vec();
        shuffled.shuffle(rng);
        picked.extend(shuffled.into_iter().take(share));
    }
    picked.shuffle(rng);
    picked
}

pub fn balanced_random_tags(count: usize) -> Vec<&'static str> {
    balanced_sample(&TagCategory::all_pools(), count, &mut rand::rng())
}

pub fn random_question() -> &'static str {
    EDUCATIONAL_QUESTIONS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("How do rivers shape landscapes?")
}

/// Which category a tag belongs to, if any.
pub fn category_of(tag: &str) -> Option<TagCategory> {
    TagCategory::iter().find(|c| c.tags().contains(&tag))
}
