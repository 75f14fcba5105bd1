//! Ready-made widgets styled for daisyUI.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{Component, ComponentId};
use crate::element::{button, icon, img, input_, span, Classes, ElementBuilder};
use crate::error::Result;
use crate::reactive::Signal;

/// A `btn` button, optionally `btn-<modifier>` and `btn-disabled`.
pub fn styled_button(modifier: Option<&str>, disabled: bool) -> ElementBuilder {
    let mut classes = Classes::from("btn");
    if let Some(modifier) = modifier {
        classes.append(format!("btn-{}", modifier));
    }
    if disabled {
        classes.append("btn-disabled");
    }
    button().classes(classes)
}

/// A text input whose `value` is two-way bound to `value`.
pub fn text_input(value: &Signal<String>, placeholder: &str) -> ElementBuilder {
    input_()
        .classes("input form-control")
        .attr("placeholder", placeholder)
        .bind("value", value)
}

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(String),
    /// Inlined as a base64 `data:` URI.
    File { path: PathBuf, media_type: String },
}

/// An `<img>` with `src` and `alt`.
pub fn image(source: &ImageSource, alt: &str) -> Result<ElementBuilder> {
    let src = match source {
        ImageSource::Url(url) => url.clone(),
        ImageSource::File { path, media_type } => {
            let bytes = std::fs::read(path)?;
            format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
        }
    };
    Ok(img().attr("src", src).attr("alt", alt))
}

/// A lucide icon by name.
pub struct Icon {
    id: ComponentId,
    name: String,
}

impl Icon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ComponentId::new(),
            name: name.into(),
        }
    }
}

impl Component for Icon {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn render(&self) -> Result<()> {
        icon().attr("data_lucide", &self.name).text("")
    }
}

/// A centered loading spinner.
pub struct Loading {
    id: ComponentId,
}

impl Default for Loading {
    fn default() -> Self {
        Self::new()
    }
}

impl Loading {
    pub fn new() -> Self {
        Self {
            id: ComponentId::new(),
        }
    }
}

impl Component for Loading {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn classes(&self) -> Classes {
        Classes::from("flex justify-center items-center w-full h-full")
    }

    fn render(&self) -> Result<()> {
        span().classes("loading loading-md loading-bars").text("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_styled_button_classes() {
        let html = render(None, || styled_button(Some("primary"), true).text("Go")).unwrap();
        assert_eq!(
            html,
            r#"<button class="btn btn-primary btn-disabled">Go</button>"#
        );
        let plain = render(None, || styled_button(None, false).text("Go")).unwrap();
        assert_eq!(plain, r#"<button class="btn">Go</button>"#);
    }

    #[test]
    fn test_icon_and_loading() {
        let html = render(None, || Icon::new("github").render()).unwrap();
        assert_eq!(html, r#"<i data-lucide="github"></i>"#);
        let html = render(None, || Loading::new().render()).unwrap();
        assert_eq!(
            html,
            r#"<span class="loading loading-md loading-bars"></span>"#
        );
    }

    #[test]
    fn test_text_input_binds_value() {
        let value = Signal::new("draft".to_string());
        let element = text_input(&value, "Type here").build();
        assert_eq!(element.classes.render(), "input form-control");
        assert_eq!(
            element.attrs.get("placeholder").map(String::as_str),
            Some("Type here")
        );
        assert_eq!(element.attrs.get("value").map(String::as_str), Some("draft"));
        assert!(element.bind.is_some());
    }

    #[test]
    fn test_image_sources() {
        let url = image(&ImageSource::Url("/logo.png".into()), "logo")
            .unwrap()
            .build();
        assert_eq!(url.attrs.get("src").map(String::as_str), Some("/logo.png"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let inline = image(
            &ImageSource::File {
                path: file.path().to_path_buf(),
                media_type: "image/png".into(),
            },
            "inline",
        )
        .unwrap()
        .build();
        assert_eq!(
            inline.attrs.get("src").map(String::as_str),
            Some("data:image/png;base64,YWJj")
        );

        let missing = image(
            &ImageSource::File {
                path: PathBuf::from("/definitely/not/here.png"),
                media_type: "image/png".into(),
            },
            "missing",
        );
        assert!(missing.is_err());
    }
}
