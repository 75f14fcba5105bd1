//! One builder function per supported tag.

use super::{ElementBuilder, Tag};

macro_rules! builders {
    ($($name:ident => $tag:ident),* $(,)?) => {
        $(
            #[doc = concat!("Builder for `<", stringify!($name), ">`.")]
            pub fn $name() -> ElementBuilder {
                ElementBuilder::new(Tag::$tag)
            }
        )*
    };
}

builders! {
    html => Html,
    head => Head,
    body => Body,
    meta => Meta,
    link => Link,
    script => Script,
    title => Title,
    style_ => Style,
    icon => Icon,
    div => Div,
    span => Span,
    button => Button,
    input_ => Input,
    textarea => Textarea,
    select => Select,
    option_ => Option,
    label => Label,
    a => A,
    img => Img,
    p => P,
    pre => Pre,
    code => Code,
    h1 => H1,
    h2 => H2,
    h3 => H3,
    h4 => H4,
    h5 => H5,
    h6 => H6,
    ul => Ul,
    ol => Ol,
    li => Li,
    table => Table,
    thead => Thead,
    tbody => Tbody,
    tr => Tr,
    td => Td,
    th => Th,
    form => Form,
    header => Header,
    footer => Footer,
    nav => Nav,
    section => Section,
    figure => Figure,
    svg => Svg,
    br => Br,
    hr => Hr,
}

/// Builder for an arbitrary tag, including the synthetic ones.
pub fn element(tag: Tag) -> ElementBuilder {
    ElementBuilder::new(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_carry_their_tag() {
        assert_eq!(div().build().tag, Tag::Div);
        assert_eq!(input_().build().tag, Tag::Input);
        assert_eq!(icon().build().tag, Tag::Icon);
        assert_eq!(element(Tag::Component).build().tag, Tag::Component);
    }
}
