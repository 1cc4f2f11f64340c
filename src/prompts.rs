use crate::message::ChatMessage;

// Player turns after which option generation starts steering toward the research question.
pub const RESEARCH_BIAS_AFTER_TURNS: usize = 3;

pub const EVALUATOR_PREAMBLE: &str = r#"
You are an evaluator for an educational game. A player interviewed a character about a
research question. Decide whether the character's answer adequately addresses it.

Use the numbered criteria below. The answer is adequate when it satisfies at least 2-3 of
them. If a conversation history is included, judge the answer in light of everything the
character already said.

Respond with ONLY "yes" or "no" - nothing else.
"#;

pub const OPTIONS_PREAMBLE: &str = r#"
You are a game designer creating engaging questions for an educational AI game.

Make the questions:
- Natural and conversational (not just direct topic questions)
- Varied in approach (personal experience, opinions, explanations, etc.)
- Engaging and game-like
- Based on what this persona would know or have experienced

Respond with a JSON array in this exact format and nothing else:
[
  {"id": "A", "text": "question text here"},
  {"id": "B", "text": "question text here"},
  {"id": "C", "text": "question text here"}
]
"#;

pub const PERSONA_PREAMBLE: &str = r#"
You create characters for an educational game played by young learners. The player picked a
handful of traits; invent ONE memorable character who combines all of them and who could
plausibly talk about the research question.

Keep the character kind, age-appropriate and grounded. Mystical traits are a light touch,
never the whole identity.

Respond with a JSON object in this exact format and nothing else:
{"name": "character name", "description": "Name, a ... who ... (2-3 sentences, written in the third person)"}
"#;

pub const QUESTION_SETUP_PREAMBLE: &str = r#"
You prepare research questions for an educational game. Given a question, produce:
- "targetTopic": a short label (2-5 words) for the subject of the question
- "context": 1-2 sentences of background that prime a character to answer it well
- "validationCriteria": 3-5 independent yes/no requirements a good answer must meet

Respond with a JSON object in this exact format and nothing else:
{"targetTopic": "...", "context": "...", "validationCriteria": ["...", "...", "..."]}
"#;

fn context_line(context: &str) -> String {
    if context.trim().is_empty() {
        String::new()
    } else {
        format!(" Context: {}", context.trim())
    }
}

pub fn answer_messages(persona: &str, character_name: &str, question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are {}. {} Stay in character and respond to questions from your own perspective and knowledge. \
             Keep answers under 200 words and suitable for young learners.{}",
            character_name,
            persona,
            context_line(context)
        )),
        ChatMessage::user(question),
    ]
}

pub fn greeting_messages(persona: &str, character_name: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are {}. {} A curious traveller has just found you in the Records of Amur Isondo. \
             Greet them in character in two or three sentences and invite their questions.{}",
            character_name,
            persona,
            context_line(context)
        )),
        ChatMessage::user("Hello! Who are you?"),
    ]
}

pub fn evaluation_messages(
    question: &str,
    answer: &str,
    target_topic: &str,
    criteria: &[String],
    history: Option<&[ChatMessage]>,
) -> Vec<ChatMessage> {
    let numbered: Vec<String> = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect();
    let mut system = format!(
        "{}\nTopic: {}\nCriteria:\n{}",
        EVALUATOR_PREAMBLE.trim(),
        target_topic,
        numbered.join("\n")
    );
    if let Some(history) = history.filter(|h| !h.is_empty()) {
        system.push_str("\n\nConversation so far:\n");
        system.push_str(&render_history(history));
    }

    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!(
            "Question: {}\nAnswer: {}\n\nDoes this answer adequately address the question about {}?",
            question, answer, target_topic
        )),
    ]
}

pub fn options_messages(
    persona: &str,
    context: &str,
    history: &[ChatMessage],
    target_topic: &str,
    research_question: Option<&str>,
) -> Vec<ChatMessage> {
    let mut system = format!("{}\nThe player is talking to {}.", OPTIONS_PREAMBLE.trim(), persona);
    system.push_str(&context_line(context));
    if !target_topic.trim().is_empty() {
        system.push_str(&format!("\nThe overall topic we're exploring is: {}", target_topic));
    }
    if !history.is_empty() {
        system.push_str("\n\nChat history:\n");
        system.push_str(&render_history(history));
        system.push_str("\n\nBuild on the previous conversation naturally.");
    }

    let player_turns = history
        .iter()
        .filter(|m| m.role == crate::message::ChatRole::User)
        .count();
    if let Some(question) = research_question.filter(|_| player_turns >= RESEARCH_BIAS_AFTER_TURNS) {
        system.push_str(&format!(
            "\n\nThe player still needs an answer to: \"{}\". At least one of the three questions must steer the character toward answering it directly.",
            question
        ));
    }

    let request = if history.is_empty() {
        "Generate 3 initial questions to start our conversation."
    } else {
        "Generate 3 new follow-up questions based on our conversation so far."
    };
    vec![ChatMessage::system(system), ChatMessage::user(request)]
}

pub fn persona_messages(tags: &[String], question: &str, target_topic_hint: &str) -> Vec<ChatMessage> {
    let mut request = format!("Traits: {}\nResearch question: {}", tags.join(", "), question);
    if !target_topic_hint.trim().is_empty() {
        request.push_str(&format!("\nTopic: {}", target_topic_hint));
    }
    vec![
        ChatMessage::system(PERSONA_PREAMBLE.trim()),
        ChatMessage::user(request),
    ]
}

pub fn question_setup_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(QUESTION_SETUP_PREAMBLE.trim()),
        ChatMessage::user(format!("Question: {}", question)),
    ]
}

pub fn elaboration_messages(
    persona: &str,
    character_name: &str,
    question: &str,
    previous_answer: &str,
    context: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are {}. {} The traveller asked you a question and your answer did not fully address it. \
             Give a follow-up that answers the original question more completely.{}",
            character_name,
            persona,
            context_line(context)
        )),
        ChatMessage::user(format!("Original question: {}", question)),
        ChatMessage::assistant(previous_answer),
        ChatMessage::user("Can you elaborate more on the original question? I need a more complete answer."),
    ]
}

fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(turns: usize) -> Vec<ChatMessage> {
        let mut h = vec![ChatMessage::assistant("Greetings, traveller.")];
        for i in 0..turns {
            h.push(ChatMessage::user(format!("question {}", i)));
            h.push(ChatMessage::assistant(format!("answer {}", i)));
        }
        h
    }

    #[test]
    fn research_bias_kicks_in_after_three_turns() {
        let early = options_messages("a miller", "", &history(2), "bread", Some("How is flour made?"));
        assert!(!early[0].content.contains("How is flour made?"));

        let late = options_messages("a miller", "", &history(3), "bread", Some("How is flour made?"));
        assert!(late[0].content.contains("How is flour made?"));
    }

    #[test]
    fn evaluation_numbers_criteria() {
        let criteria = vec!["mentions rain".to_string(), "mentions clouds".to_string()];
        let messages = evaluation_messages("q", "a", "water", &criteria, None);
        assert!(messages[0].content.contains("1. mentions rain"));
        assert!(messages[0].content.contains("2. mentions clouds"));
        assert!(!messages[0].content.contains("Conversation so far"));
    }
}
