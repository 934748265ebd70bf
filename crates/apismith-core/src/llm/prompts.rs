//! Prompt templates for the three model calls.

use crate::types::TargetLanguage;

/// System instruction for splitting a free-form request into link and goal.
pub const QUERY_SEPARATOR_SYSTEM: &str = "\
You read short developer requests that mention a piece of API documentation. \
You separate the documentation link from what the developer wants to achieve.";

/// System instruction for the metadata extraction call.
pub const EXTRACTION_SYSTEM: &str = "\
You are a meticulous API documentation analyst. You read reference pages and \
turn them into structured metadata a developer can build a client from.";

/// User prompt asking for `{url, task}` out of a free-form request.
#[must_use]
pub fn query_separator(request: &str) -> String {
    format!(
        "Request: {request}

Work out:
1. The full link to the API documentation mentioned in the request.
2. A short statement of what the developer wants to do with that API.

Answer with a JSON object with exactly these keys:
- \"url\": the documentation link, or null when the request has none
- \"task\": the developer's goal in one sentence, or null when unclear"
    )
}

/// User prompt for extracting endpoint metadata from page text.
///
/// A missing goal asks for every endpoint on the page.
#[must_use]
pub fn extraction(page_text: &str, goal: Option<&str>) -> String {
    let goal = goal.map_or_else(
        || "not stated; include every endpoint the page documents".to_string(),
        str::to_string,
    );

    format!(
        "Documentation text:
{page_text}

Developer goal: {goal}

Instructions:
1. Find the API endpoints on this page that serve the developer goal.
2. For each endpoint record:
   - \"http_method\": GET, POST, PUT, PATCH, DELETE, ...
   - \"path\": the request path, e.g. /v1/users/{{id}}
   - \"description\": one plain sentence on what the endpoint does
   - \"parameters\": list of strings of the form \"name (type, required|optional)\"
   - \"requires_api_key\": true when the endpoint needs an API key, token or other authentication
   - \"request_example\": a sample request when the page shows one, else null
   - \"response_example\": a sample response when the page shows one, else null
3. Record the API base URL when the page gives one.
4. Leave out navigation, styling and anything unrelated to the goal.

Answer with a single JSON object:
- \"title\": name of the API
- \"base_url\": base URL, or an empty string when unknown
- \"endpoints\": array of endpoint objects as described above"
    )
}

/// System instruction for the code generation call.
#[must_use]
pub fn codegen_system(language: TargetLanguage) -> String {
    let name = language.display_name();
    format!(
        "You are a senior {name} engineer. You receive structured API metadata: a \
title, a base URL and endpoints with method, path, description, parameters, \
authentication needs and examples. You write a complete, ready to use API client \
in {name}. Keep it short and precise. Output only source code that can be saved \
directly as a .{ext} file, using ASCII characters only.",
        ext = language.extension()
    )
}

/// User prompt carrying the structured metadata to generate a client for.
#[must_use]
pub fn codegen(language: TargetLanguage, structured_api: &str) -> String {
    let name = language.display_name();
    format!(
        "Requirements:
1. Write one reusable {name} module with a client type named after the API title, \
converted to a valid {name} identifier.
2. Give every endpoint its own function or method with a descriptive name and \
documentation of its purpose, parameters and return value.
3. Apply authentication automatically. Where an endpoint carries an \"api_key\" \
value, use it as that endpoint's credential in a header or query parameter as the \
API expects.
4. Use the base URL from the metadata.
5. Handle HTTP error statuses and missing parameters.
6. Use short, precise type annotations and parse responses into native {name} \
data structures.
7. End with a brief usage example for calling the client.

Structured metadata:
{structured_api}"
    )
}
