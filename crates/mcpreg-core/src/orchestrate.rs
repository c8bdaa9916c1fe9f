//! Drives the optional assistant through the registration conversation.
//!
//! The assistant and the operator are injected behind traits; whether an
//! assistant exists is fixed when the [`Orchestrator`] is built. Every
//! assistant failure degrades to the deterministic path.

use crate::error::{RegistryError, Result};
use crate::extract::{parse_field_review, parse_reconciliation, FieldReview};
use crate::metadata::{AUTH_METHODS, LIFECYCLES, STATUSES};
use crate::naming::{normalize_suggestion, slug_from_description, MAX_SUGGESTED_LEN};
use crate::reconcile::{reconcile, Reconciliation};

/// The person at the console.
pub trait Operator {
    /// Ask `question` and return the free-text answer. `choices` may be
    /// empty.
    fn answer(&mut self, question: &str, choices: &[String]) -> Result<String>;
}

/// A conversational backend.
pub trait Assistant {
    /// Run a conversation seeded with `prompt`, routing the assistant's
    /// questions to `operator`. Returns the final assistant text once the
    /// session is idle.
    fn converse(&mut self, prompt: &str, operator: &mut dyn Operator) -> Result<String>;

    /// One question, one answer, no operator involvement.
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Prompt for the conversational registration flow.
pub fn build_registration_prompt(identifier: &str) -> String {
    format!(
        r#"You are helping register an MCP server in the company registry.

Repository: {identifier}

Inspect what you can infer from the repository location and propose values for:
- name (required): lowercase letters, numbers and hyphens only
- description (required): what the server does, one or two sentences
- company (required) and owner (required)
- summary, version (semantic version, default 1.0.0), contactEmail, endpointUrl, documentationUrl, tags
- status: one of {statuses}
- lifecycle: one of {lifecycles}
- authMethod: one of {auth}

Use the AskUserQuestion tool to ask the user about anything you cannot infer, then show the complete proposal and ask the user to confirm it.

Finish with a single JSON object and nothing after it, using exactly these keys:
{{"name": "...", "description": "...", "summary": "...", "version": "...", "company": "...", "owner": "...", "status": "...", "lifecycle": "...", "authMethod": "...", "contactEmail": "...", "endpointUrl": "...", "documentationUrl": "...", "tags": ["..."], "confirmed": true}}

Set "confirmed" to false if the user declined the proposal."#,
        statuses = STATUSES.join(", "),
        lifecycles = LIFECYCLES.join(", "),
        auth = AUTH_METHODS.join(", "),
    )
}

fn name_prompt(description: &str) -> String {
    format!(
        r#"Generate an MCP server name based on this description: "{description}"

Requirements:
- lowercase only
- use hyphens to separate words
- maximum {MAX_SUGGESTED_LEN} characters
- descriptive and memorable
- follow naming conventions for APIs

Reply with ONLY the suggested name, nothing else. No explanations."#
    )
}

fn review_prompt(field: &str, value: &str) -> String {
    format!(
        r#"Validate this MCP server field:
Field: {field}
Value: '{value}'

Check whether it follows naming conventions, is clear and readable, and matches common patterns.

Respond in JSON format:
{{
  "isValid": true or false,
  "message": "explanation if invalid",
  "suggestion": "corrected version if applicable"
}}"#
    )
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    assistant: Option<Box<dyn Assistant>>,
}

impl Orchestrator {
    pub fn new(assistant: Option<Box<dyn Assistant>>) -> Self {
        Self { assistant }
    }

    pub fn has_assistant(&self) -> bool {
        self.assistant.is_some()
    }

    /// Produce the metadata for `identifier`.
    ///
    /// Without an assistant this is the fallback derivation. Assistant
    /// failures (spawn errors, timeouts, malformed replies) are logged and
    /// also fall back. Operator prompt failures are returned.
    pub fn collect(
        &mut self,
        identifier: &str,
        operator: &mut dyn Operator,
    ) -> Result<Reconciliation> {
        let Some(assistant) = self.assistant.as_mut() else {
            return Ok(reconcile(None, identifier));
        };

        let prompt = build_registration_prompt(identifier);
        match assistant.converse(&prompt, operator) {
            Ok(raw) => {
                tracing::debug!(reply = %raw, "assistant finished");
                Ok(reconcile(parse_reconciliation(&raw), identifier))
            }
            Err(e @ RegistryError::Prompt(_)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "assistant session failed, using fallback metadata");
                Ok(reconcile(None, identifier))
            }
        }
    }

    /// Name suggestion for the field-by-field flow. Falls back to a slug of
    /// the description.
    pub fn suggest_name(&mut self, description: &str) -> String {
        if let Some(assistant) = self.assistant.as_mut() {
            match assistant.ask(&name_prompt(description)) {
                Ok(reply) => match normalize_suggestion(&reply) {
                    Some(name) => return name,
                    None => tracing::warn!(reply = %reply, "unusable name suggestion"),
                },
                Err(e) => tracing::warn!(error = %e, "name suggestion failed"),
            }
        }
        slug_from_description(description)
    }

    /// Advisory review of one field value. Anything short of a decodable
    /// verdict counts as valid.
    pub fn review_field(&mut self, field: &str, value: &str) -> FieldReview {
        let Some(assistant) = self.assistant.as_mut() else {
            return FieldReview::accepted();
        };
        let reply = match assistant.ask(&review_prompt(field, value)) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, field, "field review failed");
                return FieldReview::accepted();
            }
        };
        parse_field_review(&reply).unwrap_or_else(|e| {
            tracing::debug!(error = %e, field, "field review reply not understood");
            FieldReview::accepted()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataRecord;
    use std::collections::VecDeque;

    /// Scripted assistant: asks the operator each queued question, then
    /// returns `final_text`. `ask` pops canned replies.
    struct ScriptedAssistant {
        questions: Vec<(String, Vec<String>)>,
        final_text: Result<String>,
        replies: VecDeque<Result<String>>,
        answers: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl ScriptedAssistant {
        fn new(final_text: Result<String>) -> Self {
            Self {
                questions: Vec::new(),
                final_text,
                replies: VecDeque::new(),
                answers: Default::default(),
            }
        }
    }

    impl Assistant for ScriptedAssistant {
        fn converse(&mut self, prompt: &str, operator: &mut dyn Operator) -> Result<String> {
            assert!(prompt.contains("Repository:"));
            for (q, choices) in &self.questions {
                let a = operator.answer(q, choices)?;
                self.answers.borrow_mut().push(a);
            }
            match &self.final_text {
                Ok(t) => Ok(t.clone()),
                Err(e) => Err(RegistryError::Assistant(e.to_string())),
            }
        }

        fn ask(&mut self, _prompt: &str) -> Result<String> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(RegistryError::Assistant("no reply".into())))
        }
    }

    struct FixedOperator(&'static str);

    impl Operator for FixedOperator {
        fn answer(&mut self, _question: &str, _choices: &[String]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenOperator;

    impl Operator for BrokenOperator {
        fn answer(&mut self, _question: &str, _choices: &[String]) -> Result<String> {
            Err(RegistryError::Prompt("stdin closed".into()))
        }
    }

    const REPO: &str = "https://github.com/Acme/My_Repo";

    fn expect_record(r: Reconciliation) -> MetadataRecord {
        match r {
            Reconciliation::Record(m) => m,
            Reconciliation::Cancelled => panic!("cancelled"),
        }
    }

    #[test]
    fn prompt_embeds_identifier_and_enums() {
        let prompt = build_registration_prompt(REPO);
        assert!(prompt.contains(REPO));
        assert!(prompt.contains("active, deprecated, planned"));
        assert!(prompt.contains("design, development, testing, preview, production, deprecated, retired"));
        assert!(prompt.contains("none, api-key, oauth2, entra-id"));
        assert!(prompt.contains("\"confirmed\": true"));
        assert!(prompt.contains("AskUserQuestion"));
    }

    #[test]
    fn without_assistant_uses_fallback() {
        let mut orch = Orchestrator::new(None);
        assert!(!orch.has_assistant());
        let m = expect_record(orch.collect(REPO, &mut FixedOperator("y")).unwrap());
        assert_eq!(m.name, "my-repo");
        assert_eq!(m.owner, "Acme");
    }

    #[test]
    fn confirmed_conversation_produces_record() {
        let mut assistant = ScriptedAssistant::new(Ok(
            "Great, registering now.\n```json\n{\"name\":\"weather\",\"description\":\"Weather\",\"company\":\"Acme\",\"owner\":\"ops\",\"confirmed\":true}\n```".into(),
        ));
        assistant
            .questions
            .push(("Is the name right?".into(), vec!["yes".into(), "no".into()]));
        let answers = assistant.answers.clone();
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));

        let m = expect_record(orch.collect(REPO, &mut FixedOperator("yes")).unwrap());
        assert_eq!(m.name, "weather");
        assert_eq!(m.company, "acme");
        assert_eq!(m.repository_url, REPO);
        assert_eq!(*answers.borrow(), vec!["yes".to_string()]);
    }

    #[test]
    fn declined_conversation_cancels() {
        let assistant = ScriptedAssistant::new(Ok("OK, stopping. {\"confirmed\": false}".into()));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        assert_eq!(
            orch.collect(REPO, &mut FixedOperator("n")).unwrap(),
            Reconciliation::Cancelled
        );
    }

    #[test]
    fn malformed_reply_falls_back() {
        let assistant = ScriptedAssistant::new(Ok("I'm not sure. {\"name\": ".into()));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        let m = expect_record(orch.collect(REPO, &mut FixedOperator("")).unwrap());
        assert_eq!(m.auth_method, "none");
        assert_eq!(m.company, "Acme");
    }

    #[test]
    fn session_error_falls_back() {
        let assistant = ScriptedAssistant::new(Err(RegistryError::Assistant("timed out".into())));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        let m = expect_record(orch.collect(REPO, &mut FixedOperator("")).unwrap());
        assert_eq!(m.name, "my-repo");
    }

    #[test]
    fn operator_failure_propagates() {
        let mut assistant = ScriptedAssistant::new(Ok("{\"confirmed\":true}".into()));
        assistant.questions.push(("Name?".into(), vec![]));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        assert!(matches!(
            orch.collect(REPO, &mut BrokenOperator),
            Err(RegistryError::Prompt(_))
        ));
    }

    #[test]
    fn suggest_name_normalizes_reply() {
        let mut assistant = ScriptedAssistant::new(Ok(String::new()));
        assistant.replies.push_back(Ok("  Weather_Lookup \n".into()));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        assert_eq!(orch.suggest_name("Looks up weather"), "weather-lookup");
    }

    #[test]
    fn suggest_name_falls_back_to_description() {
        let mut orch = Orchestrator::new(None);
        assert_eq!(orch.suggest_name("Looks up Weather!"), "looks-up-weather");

        let mut assistant = ScriptedAssistant::new(Ok(String::new()));
        assistant.replies.push_back(Ok("???".into()));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));
        assert_eq!(orch.suggest_name("Weather tool"), "weather-tool");
    }

    #[test]
    fn review_field_decodes_verdict() {
        let mut assistant = ScriptedAssistant::new(Ok(String::new()));
        assistant.replies.push_back(Ok(
            "{\"isValid\": false, \"message\": \"Too short\", \"suggestion\": \"weather-lookup\"}".into(),
        ));
        assistant.replies.push_back(Ok("no json here".into()));
        let mut orch = Orchestrator::new(Some(Box::new(assistant)));

        let review = orch.review_field("name", "wx");
        assert!(!review.is_valid);
        assert_eq!(review.suggestion.as_deref(), Some("weather-lookup"));

        assert_eq!(orch.review_field("name", "wx"), FieldReview::accepted());
        // replies exhausted: ask errors
        assert_eq!(orch.review_field("name", "wx"), FieldReview::accepted());
    }

    #[test]
    fn review_without_assistant_accepts() {
        assert!(Orchestrator::new(None).review_field("name", "anything").is_valid);
    }
}
