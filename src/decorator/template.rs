//! Message templates and the canned default logging textures

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::texture::{EventTexture, LoggingTexture, Texture};
use crate::sink::{EventKind, LogLevel, LogState};

pub const REQUEST_TEMPLATE: &str = "[#{objectName}.#{methodName}] method is called";
pub const SUCCESS_TEMPLATE: &str = "[#{objectName}.#{methodName}] method has finished";
pub const FAILURE_TEMPLATE: &str = "[#{objectName}.#{methodName}] method has failed";

pub const STREAM_REQUEST_TEMPLATE: &str =
    "[#{streamId}] [#{objectName}.#{methodName}] #{requestType} #{requestId} is called";
pub const STREAM_SUCCESS_TEMPLATE: &str =
    "[#{streamId}] [#{objectName}.#{methodName}] #{requestType} #{requestId} has finished";
pub const STREAM_FAILURE_TEMPLATE: &str =
    "[#{streamId}] [#{objectName}.#{methodName}] #{requestType} #{requestId} has failed";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{(\w+)\}").expect("invalid placeholder pattern"));

static PLAIN_DEFAULT: Lazy<Texture> = Lazy::new(|| {
    build_default([REQUEST_TEMPLATE, SUCCESS_TEMPLATE, FAILURE_TEMPLATE])
});

static STREAM_DEFAULT: Lazy<Texture> = Lazy::new(|| {
    build_default([
        STREAM_REQUEST_TEMPLATE,
        STREAM_SUCCESS_TEMPLATE,
        STREAM_FAILURE_TEMPLATE,
    ])
});

fn build_default([request, success, failure]: [&str; 3]) -> Texture {
    Texture::default().with_logging(
        LoggingTexture::on()
            .with_on_request(
                EventTexture::default()
                    .with_template(request)
                    .with_log_level(LogLevel::Debug),
            )
            .with_on_success(
                EventTexture::default()
                    .with_template(success)
                    .with_log_level(LogLevel::Debug),
            )
            .with_on_failure(
                EventTexture::default()
                    .with_template(failure)
                    .with_log_level(LogLevel::Error),
            ),
    )
}

/// Default texture merged under method textures when `useDefaultTexture` is on
pub fn default_texture(stream_aware: bool) -> &'static Texture {
    if stream_aware {
        &STREAM_DEFAULT
    } else {
        &PLAIN_DEFAULT
    }
}

/// Template used when an event texture carries none
pub fn fallback_template(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Request => REQUEST_TEMPLATE,
        EventKind::Success => SUCCESS_TEMPLATE,
        EventKind::Failure => FAILURE_TEMPLATE,
    }
}

/// Level used when an event texture carries none
pub fn default_level(kind: EventKind) -> LogLevel {
    match kind {
        EventKind::Failure => LogLevel::Error,
        EventKind::Request | EventKind::Success => LogLevel::Debug,
    }
}

/// Substitute `#{name}` placeholders from the log state; unknown names stay as written
pub fn render(template: &str, kind: EventKind, state: &LogState) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match name {
                "objectName" => state.object_name.clone(),
                "methodName" => state.method_name.clone(),
                "requestId" => state.request_id.clone(),
                "requestType" => format!("{:?}", state.request_type).to_lowercase(),
                "actionFlow" => format!("{:?}", state.action_flow).to_lowercase(),
                "streamId" => state.stream_id.clone().unwrap_or_default(),
                "kind" => kind.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ActionFlow, RequestType};
    use serde_json::json;

    fn state() -> LogState {
        LogState {
            stream_id: Some("run-1".to_string()),
            object_name: "app/services/users".to_string(),
            method_name: "store.find".to_string(),
            request_id: "req-9".to_string(),
            request_type: RequestType::Link,
            action_flow: ActionFlow::Explicit,
            req_context: json!({}),
        }
    }

    #[test]
    fn test_render_known_placeholders() {
        let text = render(
            "#{streamId}|#{objectName}|#{methodName}|#{requestId}|#{requestType}|#{actionFlow}|#{kind}",
            EventKind::Success,
            &state(),
        );
        assert_eq!(
            text,
            "run-1|app/services/users|store.find|req-9|link|explicit|success"
        );
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(
            render("#{nope} #{methodName}", EventKind::Request, &state()),
            "#{nope} store.find"
        );
    }

    #[test]
    fn test_default_textures() {
        let plain = default_texture(false).logging.as_ref().unwrap();
        assert_eq!(plain.enabled, Some(true));
        assert_eq!(
            plain.on_failure.as_ref().unwrap().log_level,
            Some(LogLevel::Error)
        );
        let stream = default_texture(true).logging.as_ref().unwrap();
        assert!(
            stream
                .on_request
                .as_ref()
                .unwrap()
                .template
                .as_deref()
                .unwrap()
                .contains("#{streamId}")
        );
        assert_eq!(default_level(EventKind::Request), LogLevel::Debug);
    }
}
