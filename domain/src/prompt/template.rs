//! Prompt templates for analysis tasks and agent runs

use crate::routing::approval::ApprovalRequest;
use crate::routing::model::AgentDescriptor;

/// Templates for the prompts sent through the router
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for `ai_analysis` tasks
    pub fn analyst_system() -> &'static str {
        r#"You are an analytical assistant working inside a task automation system.
Read the material carefully and produce a structured, factual analysis.
Lead with the key findings, then supporting detail, then recommended next steps.
If the material is insufficient, say what is missing instead of guessing."#
    }

    /// User prompt for `ai_analysis` tasks
    pub fn analysis_prompt(content: &str, analysis_type: Option<&str>) -> String {
        match analysis_type {
            Some(kind) => format!(
                r#"Perform a {} analysis of the following:

{}

Respond with findings, supporting evidence and next steps."#,
                kind, content
            ),
            None => format!(
                r#"Analyze the following:

{}

Respond with findings, supporting evidence and next steps."#,
                content
            ),
        }
    }

    /// System prompt for `data_analysis` tasks
    pub fn data_analyst_system() -> &'static str {
        r#"You are a data analyst working inside a task automation system.
You receive a dataset as JSON. Describe its shape, the notable values and any anomalies.
Quote figures exactly as they appear in the data and never invent rows or columns."#
    }

    /// User prompt for `data_analysis` tasks
    pub fn data_analysis_prompt(data: &str, question: Option<&str>) -> String {
        let question = question.unwrap_or("Summarize the dataset and highlight anything unusual.");
        format!(
            r#"Dataset:
{}

Question: {}"#,
            data, question
        )
    }

    /// System prompt for `report_generation` tasks
    pub fn report_writer_system() -> &'static str {
        r#"You are a report writer working inside a task automation system.
Write in plain business prose with one heading per requested section.
Base every statement on the supplied material and mark gaps explicitly."#
    }

    /// User prompt for `report_generation` tasks
    pub fn report_prompt(title: &str, sections: &[String], material: Option<&str>) -> String {
        let mut prompt = format!("Write a report titled \"{}\".\n", title);
        if !sections.is_empty() {
            prompt.push_str("\nSections:\n");
            for section in sections {
                prompt.push_str(&format!("- {}\n", section));
            }
        }
        if let Some(material) = material {
            prompt.push_str(&format!("\nMaterial:\n{}\n", material));
        }
        prompt
    }

    /// System prompt for an approved agent run
    pub fn agent_system(agent: &AgentDescriptor, request: &ApprovalRequest) -> String {
        let mut prompt = format!("{}\n\n", agent.persona);

        prompt.push_str("Capabilities:\n");
        for capability in &agent.capabilities {
            prompt.push_str(&format!("- {}\n", capability));
        }

        prompt.push_str(&format!(
            r#"
Risk level: {}
Time budget: {} seconds (hard limit {} seconds)
Approved by: {}

Stay within the approved task. Report what you did and anything you chose not to do."#,
            agent.risk_level,
            request.estimated_time.as_secs(),
            agent.max_execution_time.as_secs(),
            request.approver.as_deref().unwrap_or("unknown"),
        ));

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::registry::ModelRegistry;
    use chrono::Utc;

    #[test]
    fn test_analysis_prompt_includes_type() {
        let prompt = PromptTemplate::analysis_prompt("Q3 revenue fell", Some("financial"));
        assert!(prompt.contains("financial analysis"));
        assert!(prompt.contains("Q3 revenue fell"));

        let prompt = PromptTemplate::analysis_prompt("Q3 revenue fell", None);
        assert!(prompt.starts_with("Analyze the following"));
    }

    #[test]
    fn test_data_analysis_prompt_default_question() {
        let prompt = PromptTemplate::data_analysis_prompt("[1, 2, 3]", None);
        assert!(prompt.starts_with("Dataset:\n[1, 2, 3]"));
        assert!(prompt.contains("Question: Summarize the dataset"));

        let prompt = PromptTemplate::data_analysis_prompt("[1]", Some("Is it sorted?"));
        assert!(prompt.ends_with("Question: Is it sorted?"));
    }

    #[test]
    fn test_report_prompt_lists_sections() {
        let sections = vec!["Summary".to_string(), "Risks".to_string()];
        let prompt = PromptTemplate::report_prompt("Q3 review", &sections, Some("revenue 1.2M"));
        assert!(prompt.starts_with("Write a report titled \"Q3 review\"."));
        assert!(prompt.contains("- Summary\n- Risks\n"));
        assert!(prompt.contains("Material:\nrevenue 1.2M"));

        let bare = PromptTemplate::report_prompt("Q3 review", &[], None);
        assert!(!bare.contains("Sections:"));
        assert!(!bare.contains("Material:"));
    }

    #[test]
    fn test_agent_system_embeds_profile() {
        let registry = ModelRegistry::default();
        let agent = registry.agent("code-architect-agent").unwrap();
        let mut request =
            ApprovalRequest::for_agent(agent, "Split the billing service", None, None, Utc::now());
        request.approve("bob");

        let prompt = PromptTemplate::agent_system(agent, &request);
        assert!(prompt.starts_with(&agent.persona));
        assert!(prompt.contains("- system-design"));
        assert!(prompt.contains("Risk level: high"));
        assert!(prompt.contains("hard limit 900 seconds"));
        assert!(prompt.contains("Approved by: bob"));
    }
}
