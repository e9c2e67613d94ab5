//! Local canned-reply generation.
//!
//! When a dispatch fails, the user still gets a reply. Timeout and
//! connection failures map to fixed strings; anything else runs the input
//! through a keyword table, falling back to a seeded-RNG pick from a pool
//! of generic acknowledgements. Given the same seed and inputs, the
//! generator is fully deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed reply for a dispatch that hit the 30-second deadline.
pub const TIMEOUT_REPLY: &str =
    "Сервер отвечает слишком долго. Попробуй ещё раз через минуту.";

/// Fixed reply for a connection-level failure.
pub const CONNECTION_REPLY: &str =
    "Не получается связаться с сервером. Проверь соединение и попробуй снова.";

/// Keyword table: the first matching entry wins.
const KEYWORD_REPLIES: &[(&[&str], &str)] = &[
    (
        &["привет", "здравств", "hello", "hi "],
        "Привет! Чем могу помочь?",
    ),
    (
        &["как дела", "how are you"],
        "Всё отлично, смотрю стримы. А у тебя?",
    ),
    (
        &["кто ты", "как тебя зовут", "your name"],
        "Я ассистент sMeNa.Tv, локальная версия.",
    ),
    (
        &["стрим", "эфир", "stream"],
        "Расписание стримов есть на главной странице sMeNa.Tv.",
    ),
    (&["спасибо", "thanks", "thank you"], "Всегда пожалуйста!"),
    (&["пока", "до свидания", "bye"], "Пока! Заходи ещё."),
    (
        &["помо", "help"],
        "Могу поболтать, показать статус системы или экспортировать историю чата.",
    ),
];

/// Generic acknowledgements used when no keyword matches.
const GENERIC_REPLIES: &[&str] = &[
    "Интересно! Расскажи подробнее.",
    "Понимаю. Что ещё тебя волнует?",
    "Хороший вопрос. Сейчас я работаю в автономном режиме, но постараюсь помочь.",
    "Хм, давай обсудим это, когда сервер снова будет на связи.",
    "Принято! Продолжай.",
];

/// Deterministic-given-seed canned-reply generator.
#[derive(Debug)]
pub struct FallbackGenerator {
    rng: StdRng,
}

impl FallbackGenerator {
    /// Creates a generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces a canned reply for the given input.
    ///
    /// Keyword matches are case-insensitive substring checks; unmatched
    /// input draws from the generic pool.
    pub fn reply(&mut self, input: &str) -> String {
        let lowered = input.to_lowercase();
        for (keywords, reply) in KEYWORD_REPLIES {
            if keywords.iter().any(|k| lowered.contains(k)) {
                return (*reply).to_string();
            }
        }
        let pick = self.rng.gen_range(0..GENERIC_REPLIES.len());
        GENERIC_REPLIES[pick].to_string()
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive() {
        let mut generator = FallbackGenerator::new(1);
        assert_eq!(generator.reply("ПРИВЕТ всем"), "Привет! Чем могу помочь?");
        assert_eq!(generator.reply("Спасибо большое"), "Всегда пожалуйста!");
    }

    #[test]
    fn first_matching_keyword_wins() {
        let mut generator = FallbackGenerator::new(1);
        // Contains both a greeting and a thanks; the table is ordered.
        assert_eq!(
            generator.reply("привет и спасибо"),
            "Привет! Чем могу помочь?"
        );
    }

    #[test]
    fn unmatched_input_draws_from_pool() {
        let mut generator = FallbackGenerator::new(7);
        let reply = generator.reply("квантовая хромодинамика");
        assert!(GENERIC_REPLIES.contains(&reply.as_str()));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = FallbackGenerator::new(42);
        let mut b = FallbackGenerator::new(42);
        for _ in 0..10 {
            assert_eq!(a.reply("xyzzy"), b.reply("xyzzy"));
        }
    }
}
