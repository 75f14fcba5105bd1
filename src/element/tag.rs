//! The closed set of tags an element may carry.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! tags {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// HTML tags plus the synthetic tags used by the framework.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant),*
        }

        impl Tag {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }
        }

        impl FromStr for Tag {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)*
                    other => Err(Error::malformed(format!("unknown tag '{}'", other))),
                }
            }
        }
    };
}

tags! {
    Root => "schorle-root",
    Component => "schorle-component",
    Html => "html",
    Head => "head",
    Body => "body",
    Meta => "meta",
    Link => "link",
    Script => "script",
    Title => "title",
    Style => "style",
    Icon => "i",
    Div => "div",
    Span => "span",
    Button => "button",
    Input => "input",
    Textarea => "textarea",
    Select => "select",
    Option => "option",
    Label => "label",
    A => "a",
    Img => "img",
    P => "p",
    Pre => "pre",
    Code => "code",
    H1 => "h1",
    H2 => "h2",
    H3 => "h3",
    H4 => "h4",
    H5 => "h5",
    H6 => "h6",
    Ul => "ul",
    Ol => "ol",
    Li => "li",
    Table => "table",
    Thead => "thead",
    Tbody => "tbody",
    Tr => "tr",
    Td => "td",
    Th => "th",
    Form => "form",
    Header => "header",
    Footer => "footer",
    Nav => "nav",
    Section => "section",
    Figure => "figure",
    Svg => "svg",
    Br => "br",
    Hr => "hr",
}

impl Tag {
    /// Tags that never carry content and serialize without a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::Meta | Self::Input | Self::Img | Self::Br | Self::Hr
        )
    }

    /// Tags that must keep an explicit closing tag even when empty.
    pub fn needs_explicit_close(&self) -> bool {
        matches!(self, Self::Script | Self::Link | Self::Icon)
    }

    /// Elements whose text is emitted verbatim, without entity escaping.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Self::Script | Self::Style)
    }

    /// Framework-only tags that are never sent to the browser as-is.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        assert_eq!("div".parse::<Tag>().unwrap(), Tag::Div);
        assert_eq!(Tag::Icon.as_str(), "i");
        assert_eq!(Tag::Component.to_string(), "schorle-component");
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let err = "blink".parse::<Tag>().unwrap_err();
        assert!(matches!(err, Error::MalformedElement { .. }));
    }

    #[test]
    fn test_close_rules() {
        assert!(Tag::Script.needs_explicit_close());
        assert!(Tag::Link.needs_explicit_close());
        assert!(!Tag::Link.is_void());
        assert!(Tag::Input.is_void());
        assert!(!Tag::Div.is_void());
        assert!(Tag::Script.is_raw_text());
        assert!(Tag::Style.is_raw_text());
        assert!(!Tag::Span.is_raw_text());
    }
}
