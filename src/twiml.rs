//! Just enough TwiML to drive a speech conversation.

use axum::http::header;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone)]
pub struct Gather {
    pub action: String,
    pub timeout_secs: Option<u32>,
    pub prompt: Option<String>,
    pub action_on_empty_result: bool,
}

impl Gather {
    pub fn speech(action: &str) -> Self {
        Self {
            action: action.to_string(),
            timeout_secs: None,
            prompt: None,
            action_on_empty_result: false,
        }
    }

    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn say(mut self, text: &str) -> Self {
        self.prompt = Some(text.to_string());
        self
    }

    /// Post to `action` even when nothing was recognised, instead of falling
    /// through to the next verb (or hanging up when there is none).
    pub fn on_empty_result(mut self) -> Self {
        self.action_on_empty_result = true;
        self
    }
}

#[derive(Debug, Clone)]
enum Verb {
    Say(String),
    Gather(Gather),
    Redirect(String),
    Hangup,
}

#[derive(Debug, Clone)]
pub struct VoiceResponse {
    voice: String,
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new(voice: &str) -> Self {
        Self {
            voice: voice.to_string(),
            verbs: Vec::new(),
        }
    }

    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push(Verb::Say(text.to_string()));
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn redirect(mut self, url: &str) -> Self {
        self.verbs.push(Verb::Redirect(url.to_string()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn render(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => xml.push_str(&self.say_xml(text)),
                Verb::Gather(gather) => {
                    xml.push_str(&format!(
                        "<Gather input=\"speech\" action=\"{}\" method=\"POST\" speechTimeout=\"auto\" \
                         speechModel=\"phone_call\" language=\"en-US\" enhanced=\"true\"",
                        escape(&gather.action)
                    ));
                    if let Some(secs) = gather.timeout_secs {
                        xml.push_str(&format!(" timeout=\"{secs}\""));
                    }
                    if gather.action_on_empty_result {
                        xml.push_str(" actionOnEmptyResult=\"true\"");
                    }
                    xml.push('>');
                    if let Some(prompt) = &gather.prompt {
                        xml.push_str(&self.say_xml(prompt));
                    }
                    xml.push_str("</Gather>");
                }
                Verb::Redirect(url) => {
                    xml.push_str(&format!("<Redirect method=\"POST\">{}</Redirect>", escape(url)));
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }

    fn say_xml(&self, text: &str) -> String {
        format!(
            "<Say voice=\"{}\" language=\"en-US\">{}</Say>",
            escape(&self.voice),
            escape(text)
        )
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.render()).into_response()
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"Tom & Jerry's <"shop">"#),
            "Tom &amp; Jerry&apos;s &lt;&quot;shop&quot;&gt;"
        );
    }

    #[test]
    fn test_say_and_hangup() {
        let xml = VoiceResponse::new("Polly.Joanna")
            .say("Goodbye!")
            .hangup()
            .render();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>\
             <Say voice=\"Polly.Joanna\" language=\"en-US\">Goodbye!</Say><Hangup/></Response>"
        );
    }

    #[test]
    fn test_gather_with_prompt() {
        let xml = VoiceResponse::new("Polly.Joanna")
            .gather(Gather::speech("/handle_speech").timeout(8).say("How can I help?"))
            .redirect("/voice")
            .render();
        assert!(xml.contains("<Gather input=\"speech\" action=\"/handle_speech\""));
        assert!(xml.contains("timeout=\"8\">"));
        assert!(xml.contains("<Say voice=\"Polly.Joanna\" language=\"en-US\">How can I help?</Say></Gather>"));
        assert!(xml.contains("<Redirect method=\"POST\">/voice</Redirect>"));
    }

    #[test]
    fn test_gather_without_prompt_or_timeout() {
        let xml = VoiceResponse::new("alice")
            .gather(Gather::speech("/handle_speech"))
            .render();
        assert!(!xml.contains("timeout="));
        assert!(!xml.contains("actionOnEmptyResult"));
        assert!(xml.contains("enhanced=\"true\"></Gather>"));
    }

    #[test]
    fn test_gather_on_empty_result() {
        let xml = VoiceResponse::new("alice")
            .gather(Gather::speech("/handle_speech").timeout(5).on_empty_result())
            .render();
        assert!(xml.contains("timeout=\"5\" actionOnEmptyResult=\"true\"></Gather>"));
    }
}
