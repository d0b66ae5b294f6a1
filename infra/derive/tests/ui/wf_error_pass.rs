use std::borrow::Cow;
use wf_derive::wf_error;

#[wf_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<String, DemoError> {
    let raw = std::fs::read_to_string("/definitely/not/here").context("Reading fixture")?;
    Ok(raw)
}

fn main() {
    let err = read().unwrap_err();
    assert!(err.to_string().contains("(Reading fixture)"));

    let internal: DemoError = "boom".into();
    assert_eq!(internal.to_string(), "Internal error: boom");

    let with_context: Result<(), DemoError> =
        Err(DemoError::Validation { message: "bad".into(), context: None });
    let err = with_context.context("checking input").unwrap_err();
    assert_eq!(err.to_string(), "Validation error (checking input): bad");
}
