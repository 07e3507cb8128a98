//! Chat handler logic: builds the model prompt from the training examples and degrades to the
//! advisory table whenever the model is unavailable or fails.

use beeai_core::{ChatAnswer, ExampleStore, QueryMatcher, RELEVANT_EXAMPLE_LIMIT};
use beeai_skills::ModelRouter;

/// Prompt with the persona, the most relevant examples as Q/A pairs, and the question.
pub fn build_prompt(examples: &ExampleStore, question: &str) -> String {
    let mut prompt = String::from("You are Bee AI, an assistant for beekeepers and bloom-time questions.\n\nKnowledge Base:\n");
    for example in examples.relevant(question, RELEVANT_EXAMPLE_LIMIT) {
        prompt.push_str(&format!("Q: {}\nA: {}\n\n", example.question(), example.answer()));
    }
    prompt.push_str(&format!(
        "Question: {}\n\nAnswer from the knowledge above when it applies. Otherwise answer only about European plants and beekeeping. Keep it short.",
        question
    ));
    prompt
}

/// Model first, advisory table second. Never fails.
pub async fn answer_question(
    model_router: &ModelRouter,
    examples: &ExampleStore,
    matcher: &QueryMatcher,
    question: &str,
) -> ChatAnswer {
    if model_router.is_available() {
        let prompt = build_prompt(examples, question);
        match model_router.generate(&prompt).await {
            Ok(text) => return ChatAnswer::remote(text),
            Err(e) => tracing::warn!(target: "beeai::chat", error = %e, "Model generation failed, using fallback"),
        }
    } else {
        tracing::debug!(target: "beeai::chat", mode = model_router.mode().as_str(), "Model unavailable, using fallback");
    }
    ChatAnswer::fallback(matcher.answer(question))
}
