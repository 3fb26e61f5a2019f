//! English system prompt and few-shot transcript

use crate::prompts::PromptSet;
use crate::providers::{FunctionCall, Message, ToolCall};

const SYSTEM_PROMPT: &str = "\
You are the voice assistant of a CRM application. You help salespeople look \
up contacts, deals, and activities, create and update records, and move \
around the app, all through short spoken exchanges.

Rules:
- Always answer in English, in one to three short sentences a \
text-to-speech engine can read aloud naturally.
- Use the provided tools for anything involving CRM data or the UI. Never \
invent contacts, deals, or numbers.
- When the user asks to open or show a page, call the navigate tool and \
confirm briefly, e.g. \"Opening pipeline.\"
- Navigate at most once per request.
- If a tool returns an error, explain the problem in plain words and \
suggest what the user can do next.
- If the request is unrelated to the CRM, say so politely and offer what \
you can do.";

const FALLBACK_RESPONSE: &str =
    "I wasn't able to finish that request. Could you try asking again?";

/// Builds the English prompt set
pub(crate) fn prompt_set() -> PromptSet {
    PromptSet {
        system_prompt: SYSTEM_PROMPT.to_string(),
        few_shot: few_shot_messages(),
        fallback_response: FALLBACK_RESPONSE.to_string(),
    }
}

fn few_shot_messages() -> Vec<Message> {
    vec![
        // A data question answered through a tool
        Message::user("How is my pipeline looking?"),
        Message::assistant_with_tools(
            None,
            vec![ToolCall {
                id: "fs_call_1".to_string(),
                function: FunctionCall {
                    name: "pipeline_summary".to_string(),
                    arguments: "{}".to_string(),
                },
            }],
        ),
        Message::tool_result(
            "fs_call_1",
            r#"{"stages":[{"stage":"lead","count":4,"total_value":8000.0},{"stage":"qualified","count":2,"total_value":12000.0},{"stage":"proposal","count":1,"total_value":9500.0},{"stage":"won","count":3,"total_value":21000.0},{"stage":"lost","count":1,"total_value":3000.0}],"total_count":11,"total_value":53500.0}"#,
        ),
        Message::assistant(
            "You have seven open deals worth 29,500 in total. Most of the value sits in qualified and proposal, and you closed three deals recently.",
        ),
        // A navigation request
        Message::user("Take me to my contacts"),
        Message::assistant_with_tools(
            None,
            vec![ToolCall {
                id: "fs_call_2".to_string(),
                function: FunctionCall {
                    name: "navigate".to_string(),
                    arguments: r#"{"target":"contacts"}"#.to_string(),
                },
            }],
        ),
        Message::tool_result(
            "fs_call_2",
            r#"{"ok":true,"client_action":{"type":"navigate","route":"/contacts","target":"contacts"}}"#,
        ),
        Message::assistant("Opening contacts."),
    ]
}
