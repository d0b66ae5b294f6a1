use std::borrow::Cow;

#[wf_derive::wf_error]
pub enum GatedError {
    #[cfg(any())]
    #[error("Never compiled{}: {source}", format_context(.context))]
    Never { source: std::fmt::Error, context: Option<Cow<'static, str>> },

    #[error("Parse error{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<i64, GatedError> {
    Ok(raw.parse::<i64>()?)
}

fn main() {
    assert_eq!(parse("42").ok(), Some(42));
    assert!(matches!(parse("x"), Err(GatedError::Parse { context: None, .. })));
}
