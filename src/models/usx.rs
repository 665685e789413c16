//! Small helpers shared by the `to_usx` serializers.

use quick_xml::escape::escape;

pub const USX_VERSION: &str = "3.0";

pub fn escape_text(text: &str) -> String {
    escape(text).into_owned()
}

pub fn escape_attr(value: &str) -> String {
    escape(value).into_owned()
}
