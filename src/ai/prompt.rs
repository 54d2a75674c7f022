//! Prompt builders for the AI routes
//!
//! Prompt wording is part of the product surface: the search prompts
//! instruct the model to answer with a bare JSON array that
//! `ai::parse` then extracts.

use serde::Deserialize;

/// Fixed prompt used by the connectivity check route
pub const TEST_PROMPT: &str = "Say \"Hello, Gemini API is working!\"";

/// One turn of chat history as sent by the client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Paper/project record as sent to the project summarizer. Fields are
/// permissive: the client may post either a stored paper or an AI
/// search hit, so year and types accept any JSON shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectDetails {
    pub title: String,
    pub category: String,
    pub authors: Option<Vec<String>>,
    pub year: Option<serde_json::Value>,
    pub journal: Option<String>,
    pub status: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub tags: Option<Vec<String>>,
    pub types: Option<serde_json::Value>,
}

/// Startup record as sent to the startup summarizer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartupDetails {
    pub name: String,
    pub idea_summary: String,
    pub stage: Option<String>,
    pub funding_status: Option<String>,
    pub website: Option<String>,
    pub registered_on: Option<String>,
}

pub fn patent_search(query: &str) -> String {
    format!(
        r#"You are a patent search expert. Search for existing patents related to: "{query}"

Please provide a comprehensive list of existing patents that are similar or related to this query. For each patent, include:
1. Patent Title
2. Patent Number (if available)
3. Inventor(s)
4. Filing Date (approximate if exact date not known)
5. Brief Description
6. Key Claims or Features
7. Patent Status (Active, Expired, Pending)
8. Similarity Score (1-10, where 10 is most similar to the query)

Format the response as a JSON array with the following structure:
[
  {{
    "title": "Patent Title",
    "patentNumber": "US1234567",
    "inventors": ["Inventor Name 1", "Inventor Name 2"],
    "filingDate": "2020-01-15",
    "description": "Brief description of the patent",
    "keyClaims": ["Claim 1", "Claim 2", "Claim 3"],
    "status": "Active",
    "similarityScore": 8
  }}
]

Provide at least 5-10 relevant patents if they exist. If no similar patents exist, return an empty array.
Only return the JSON array, no additional text."#
    )
}

pub fn research_search(query: &str) -> String {
    format!(
        r#"You are a research expert. Search for existing research papers, academic publications, and projects related to: "{query}"

Please provide a comprehensive list of relevant research papers and projects. For each result, include:
1. Title
2. Authors (array of names)
3. Publication Year
4. Journal/Conference (if applicable)
5. Abstract/Description
6. Key Research Areas/Tags
7. Research Type (e.g., "Experimental Study", "Literature Review", "Case Study", "Technical Paper")
8. Status ("Published", "In Review", "Preprint", "Conference Paper")
9. Relevance Score (1-10, where 10 is most relevant to the query)
10. Key Findings (brief summary of main results)

Format the response as a JSON array with the following structure:
[
  {{
    "title": "Research Paper Title",
    "authors": ["Author Name 1", "Author Name 2"],
    "year": "2023",
    "journal": "Journal Name or Conference",
    "abstract": "Brief description of the research",
    "tags": ["tag1", "tag2", "tag3"],
    "type": "Research Type",
    "status": "Published",
    "relevanceScore": 8,
    "keyFindings": "Summary of main research findings and contributions"
  }}
]

Provide at least 5-10 relevant research papers if they exist. Focus on recent publications (2020-2024) when possible.
If no similar research exists, return an empty array.
Only return the JSON array, no additional text."#
    )
}

pub fn ipr_chat(message: &str, history: &[ChatMessage]) -> String {
    let transcript = if history.is_empty() {
        "This is the start of your conversation".to_string()
    } else {
        history
            .iter()
            .map(|msg| {
                let speaker = if msg.role == "user" { "Them" } else { "You" };
                format!("{}: {}", speaker, msg.content)
            })
            .collect::<Vec<String>>()
            .join("\n")
    };

    format!(
        r#"You're an experienced IPR consultant who helps people with intellectual property matters. You've been working in this field for years and know the ins and outs of patents, trademarks, and copyrights.

Write like you're talking to a colleague or client - be helpful, direct, and use everyday language. Don't sound robotic or overly formal. Share practical insights and real-world advice.

Key areas you help with:
• Patent applications and searches
• Trademark registration
• Copyright protection
• Filing procedures and costs
• Documentation and deadlines
• Common problems and solutions

Keep it conversational:
- Use "you" and "your" naturally
- Give specific, actionable advice
- Share practical tips from experience
- Mention when they should get a lawyer
- Keep it focused on IP matters
- If they ask about other stuff, just redirect back to IP topics

Previous conversation:
{transcript}

They just asked: {message}

Give them a helpful, natural response:"#
    )
}

// Renders a permissive JSON value the way a template string would:
// arrays comma-joined, strings bare, null/absent handled by callers
fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<String>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

pub fn summarize_project(project: &ProjectDetails) -> String {
    let authors = project
        .authors
        .as_ref()
        .map(|list| list.join(", "))
        .unwrap_or_else(|| "N/A".to_string());
    let year = project
        .year
        .as_ref()
        .and_then(value_text)
        .unwrap_or_else(|| "N/A".to_string());
    let journal = project
        .journal
        .as_deref()
        .filter(|j| !j.is_empty())
        .unwrap_or("N/A");
    let tags = project
        .tags
        .as_ref()
        .map(|list| list.join(", "))
        .unwrap_or_else(|| "N/A".to_string());
    let types = project
        .types
        .as_ref()
        .and_then(value_text)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"Please provide a comprehensive summary of this research project/paper in markdown format (with bold titles, bullet points if needed, and clearly structured text):

Title: {title}
Category: {category}
Authors: {authors}
Year: {year}
Journal: {journal}
Status: {status}
Abstract/Description: {abstract_text}
Tags: {tags}
Types: {types}

Please provide:
1. A concise executive summary (2-3 sentences)
2. Key research objectives and methodology
3. Main findings or expected outcomes
4. Significance and potential impact
5. Recommendations for further research or applications

Format the response using markdown: use ** for bold, bullet points, and structured sections for easy frontend rendering."#,
        title = project.title,
        category = project.category,
        status = project.status,
        abstract_text = project.abstract_text,
    )
}

// Registration dates arrive as ISO strings; render the locale-style
// M/D/YYYY the summary prompt always used
fn locale_date(raw: &str) -> String {
    match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%-m/%-d/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn summarize_startup(startup: &StartupDetails) -> String {
    let stage = startup
        .stage
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Not specified");
    let funding = startup
        .funding_status
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Not specified");
    let website = startup
        .website
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Not provided");
    let registered = startup
        .registered_on
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(locale_date)
        .unwrap_or_else(|| "Not provided".to_string());

    format!(
        r#"Please provide a comprehensive summary and analysis of the following startup:

**Startup Name:** {name}
**Business Idea:** {idea}
**Current Stage:** {stage}
**Funding Status:** {funding}
**Website:** {website}
**Registration Date:** {registered}

Please analyze this startup and provide:
1. A brief executive summary of the business
2. Key strengths and potential opportunities
3. Market positioning and competitive advantages
4. Potential challenges or risks
5. Overall assessment and growth potential

Keep the summary concise but informative, around 200-300 words."#,
        name = startup.name,
        idea = startup.idea_summary,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patent_prompt_embeds_query_and_shape() {
        let prompt = patent_search("drone delivery");
        assert!(prompt.contains("related to: \"drone delivery\""));
        assert!(prompt.contains("\"patentNumber\": \"US1234567\""));
        assert!(prompt.contains("similarityScore"));
        assert!(prompt.contains("Only return the JSON array, no additional text."));
    }

    #[test]
    fn test_research_prompt_fields() {
        let prompt = research_search("federated learning");
        assert!(prompt.contains("relevanceScore"));
        assert!(prompt.contains("keyFindings"));
        assert!(prompt.contains("recent publications (2020-2024)"));
    }

    #[test]
    fn test_chat_prompt_empty_history() {
        let prompt = ipr_chat("How do I file a patent?", &[]);
        assert!(prompt.contains("This is the start of your conversation"));
        assert!(prompt.contains("They just asked: How do I file a patent?"));
    }

    #[test]
    fn test_chat_prompt_renders_history_roles() {
        let history = vec![
            ChatMessage {
                role: "user".to_string(),
                content: "What does filing cost?".to_string(),
            },
            ChatMessage {
                role: "assistant".to_string(),
                content: "Depends on your entity size.".to_string(),
            },
        ];
        let prompt = ipr_chat("And for startups?", &history);
        assert!(prompt.contains("Them: What does filing cost?"));
        assert!(prompt.contains("You: Depends on your entity size."));
    }

    #[test]
    fn test_project_summary_placeholders() {
        let project = ProjectDetails {
            title: "Acoustic levitation".to_string(),
            ..Default::default()
        };
        let prompt = summarize_project(&project);
        assert!(prompt.contains("Authors: N/A"));
        assert!(prompt.contains("Year: N/A"));
        assert!(prompt.contains("Journal: N/A"));
        assert!(prompt.contains("Types: N/A"));
    }

    #[test]
    fn test_project_summary_renders_values() {
        let project: ProjectDetails = serde_json::from_str(
            r#"{"title":"T","authors":["A","B"],"year":2023,"types":["Journal Article","Preprint"]}"#,
        )
        .unwrap();
        let prompt = summarize_project(&project);
        assert!(prompt.contains("Authors: A, B"));
        assert!(prompt.contains("Year: 2023"));
        assert!(prompt.contains("Types: Journal Article,Preprint"));
    }

    #[test]
    fn test_startup_summary_placeholders() {
        let startup = StartupDetails {
            name: "Grafeno".to_string(),
            idea_summary: "Battery anodes".to_string(),
            ..Default::default()
        };
        let prompt = summarize_startup(&startup);
        assert!(prompt.contains("**Current Stage:** Not specified"));
        assert!(prompt.contains("**Website:** Not provided"));
        assert!(prompt.contains("**Registration Date:** Not provided"));
    }

    #[test]
    fn test_startup_summary_locale_date() {
        let startup = StartupDetails {
            name: "Grafeno".to_string(),
            idea_summary: "Battery anodes".to_string(),
            registered_on: Some("2026-03-05".to_string()),
            ..Default::default()
        };
        let prompt = summarize_startup(&startup);
        assert!(prompt.contains("**Registration Date:** 3/5/2026"));
    }
}
