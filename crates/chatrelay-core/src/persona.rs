// Chat Relay: Persona Prompt
//
// Turns the operator's profile into the system prompt for in-character replies.

use crate::atoms::types::Persona;

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

/// System prompt instructing the model to answer viewers as the streamer.
pub fn build_system_prompt(persona: &Persona) -> String {
    format!(
        "You are {nickname}.\n\
         Bio: {bio}\n\
         Style: {style}\n\
         Current Game: {game}\n\
         Setup: CPU: {cpu}, GPU: {gpu}\n\
         \n\
         Respond naturally and briefly (1-2 sentences) to viewer messages.\n\
         Be friendly, engaging, and stay in character.",
        nickname = or_default(&persona.nickname, "a streamer"),
        bio = or_default(&persona.bio, "A friendly streamer"),
        style = or_default(&persona.style, "Friendly and helpful"),
        game = or_default(&persona.game, "Various games"),
        cpu = or_default(&persona.cpu, "N/A"),
        gpu = or_default(&persona.gpu, "N/A"),
    )
}

/// The user turn for one viewer line.
pub fn build_user_turn(author: &str, text: &str) -> String {
    format!("{} says: {}", author, text)
}
