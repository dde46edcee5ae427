//! Prompt construction for the structuring calls. The completion capability
//! itself is an opaque collaborator; these functions only decide what to say
//! to it.

/// A system + user message pair, transport-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Parameters woven into the full-automation prompt.
#[derive(Debug, Clone)]
pub struct AutomationPromptParams<'a> {
    pub project_name: &'a str,
    pub jira_project_key: &'a str,
    pub confluence_space_key: &'a str,
    pub priority_scheme: &'a str,
}

/// Build the single prompt instructing the model to emit the strict-JSON
/// automation schema: meta, four documents, backlog, and notes. The model is
/// told to fabricate sensible placeholder content rather than leave sections
/// empty, and to record fabrications as assumptions.
pub fn automation_prompt(requirements: &str, params: &AutomationPromptParams<'_>) -> Prompt {
    let system = "You are a senior project-management analyst. You turn raw project \
                  requirements into complete, consistent business documentation. You reply \
                  with a single strict JSON object and nothing else: no markdown fences, no \
                  commentary."
        .to_string();

    let user = format!(
        r#"Structure the requirements below into this exact JSON shape:

{{
  "meta": {{"projectName": string, "jiraProjectKey": string, "confluenceSpaceKey": string}},
  "docs": {{
    "brd": {{"title": string, "sections": [{{"h": string, "body": string}}, ...]}},
    "frs": {{"title": string, "sections": [{{"h": string, "body": string}}, ...]}},
    "sow": {{"title": string, "sections": [{{"h": string, "body": string}}, ...]}},
    "raid": {{"title": string,
             "risks": [{{"item": string, "owner": string, "status": string, "mitigation": string}}, ...],
             "assumptions": [...], "issues": [...], "dependencies": [...]}},
    "backlogSummary": string
  }},
  "backlog": {{
    "epics": [{{"name": string, "description": string}}, ...],
    "stories": [{{"epicName": string, "summary": string, "story": string,
                 "acceptanceCriteria": [string, ...],
                 "priority": one of {priorities},
                 "storyPoints": one of 1, 2, 3, 5, 8, 13}}, ...]
  }},
  "notes": {{"assumptions": [string, ...], "openQuestions": [string, ...]}}
}}

Rules:
- Each of brd, frs and sow must have at least 4 sections.
- raid must have at least 2 entries in each of risks, assumptions, issues and dependencies.
- Every story's epicName must match the name of an epic in backlog.epics.
- Never leave a section, field or array empty: when the requirements do not cover
  something, fabricate sensible placeholder content and record what you fabricated
  or could not determine in notes.assumptions.
- Use projectName "{project}", jiraProjectKey "{jira_key}" and confluenceSpaceKey
  "{space_key}" in meta unless the requirements clearly name different values.

REQUIREMENTS:
{requirements}"#,
        priorities = params.priority_scheme,
        project = params.project_name,
        jira_key = params.jira_project_key,
        space_key = params.confluence_space_key,
    );

    Prompt { system, user }
}

/// Prompt for the standalone user-story generation endpoint: backlog only.
pub fn user_stories_prompt(requirements: &str) -> Prompt {
    let system = "You are an agile product analyst. You reply with a single strict JSON \
                  object and nothing else."
        .to_string();

    let user = format!(
        r#"Derive a user-story backlog from the requirements below as this exact JSON shape:

{{
  "epics": [{{"name": string, "description": string}}, ...],
  "stories": [{{"epicName": string, "summary": string, "story": string,
               "acceptanceCriteria": [string, ...],
               "priority": one of P0, P1, P2, P3,
               "storyPoints": one of 1, 2, 3, 5, 8, 13}}, ...]
}}

Every story's epicName must match an epic. Write stories in the canonical
"As a <role>, I want <capability> so that <benefit>" form.

REQUIREMENTS:
{requirements}"#
    );

    Prompt { system, user }
}
