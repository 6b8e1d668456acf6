use client::{DisplayNode, Transcript};
use proto::{LoadChatResponse, Role};
use wasm_bindgen::prelude::*;
use web_sys::console;

// ─── Logging helper ────────────────────────────────────────

fn log(s: &str) {
    console::log_1(&JsValue::from_str(s));
}

// ─── Public API ────────────────────────────────────────────

/// Returns the crate version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// WASM entry point, called automatically by the JS glue.
///
/// Installs the panic hook for readable browser console errors. Page
/// logic lives in the page script; this module only turns backend text
/// into markup that is safe to assign to `innerHTML`.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    log(&format!(
        "multichat-web v{} WASM module loaded",
        env!("CARGO_PKG_VERSION")
    ));
}

/// Renders one message as a `<div class="message ...">` element.
///
/// `role` is `"user"`, `"assistant"` or `"bot"`. Text outside fenced code
/// blocks and code bodies are escaped, so the result never carries markup
/// from the message itself.
#[wasm_bindgen(js_name = renderMessageHtml)]
pub fn render_message_html(role: &str, text: &str, is_error: bool) -> Result<String, JsValue> {
    message_html(role, text, is_error).map_err(|e| JsValue::from_str(&e))
}

/// Markup of the greeting shown in an empty conversation.
#[wasm_bindgen(js_name = greetingHtml)]
pub fn greeting_html() -> String {
    DisplayNode::greeting().to_html()
}

/// Renders a `GET /load_chat/{id}` body into transcript markup.
///
/// System messages are skipped and an empty history shows the
/// "Chat loaded" prompt, exactly as the terminal transcript does.
#[wasm_bindgen(js_name = renderHistoryHtml)]
pub fn render_history_html(body: &str) -> Result<String, JsValue> {
    history_html(body).map_err(|e| JsValue::from_str(&e))
}

/// Sidebar label for a title: the first 25 characters plus `...`.
#[wasm_bindgen(js_name = truncateTitle)]
pub fn truncate_title(title: &str) -> String {
    client::truncate_title(title)
}

/// Trims and validates a title before a rename request.
///
/// Throws the user-facing message when the title is blank or too long.
#[wasm_bindgen(js_name = validateTitle)]
pub fn validate_title(raw: &str) -> Result<String, JsValue> {
    client::validate_title(raw).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Appends a rendered message to the element with id `container_id` and
/// scrolls it to the bottom.
#[wasm_bindgen(js_name = appendMessage)]
pub fn append_message(
    container_id: &str,
    role: &str,
    text: &str,
    is_error: bool,
) -> Result<(), JsValue> {
    let html = render_message_html(role, text, is_error)?;
    let container = find_element(container_id)?;
    container.insert_adjacent_html("beforeend", &html)?;
    container.set_scroll_top(container.scroll_height());
    Ok(())
}

// ─── Private helpers (not exported to JS) ──────────────────

fn parse_role(role: &str) -> Result<Role, String> {
    match role.trim().to_ascii_lowercase().as_str() {
        "user" => Ok(Role::User),
        "assistant" | "bot" => Ok(Role::Assistant),
        other => Err(format!("Unsupported message role: {other}")),
    }
}

fn message_html(role: &str, text: &str, is_error: bool) -> Result<String, String> {
    let role = parse_role(role)?;
    Ok(client::render(role, text, is_error).to_html())
}

fn history_html(body: &str) -> Result<String, String> {
    let loaded: LoadChatResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid chat history: {e}"))?;
    let mut transcript = Transcript::default();
    transcript.replace_with_history(&loaded.history);
    Ok(transcript.to_html())
}

fn find_element(id: &str) -> Result<web_sys::Element, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Element #{id} not found")))
}

// ─── Tests ─────────────────────────────────────────────────
