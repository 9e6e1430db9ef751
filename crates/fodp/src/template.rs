//! Document skeleton for encoded presentations.

/// Page width of the encoder's fixed page layout.
pub const PAGE_WIDTH: &str = "28cm";

/// Page height of the encoder's fixed page layout.
pub const PAGE_HEIGHT: &str = "21cm";

pub const TITLE: &str = "{TITLE}";
pub const CREATION_DATE: &str = "{CREATION_DATE}";
pub const AUTHOR: &str = "{AUTHOR}";
pub const SLIDES: &str = "{SLIDES}";

/// Flat presentation skeleton. Namespaces, the default styles and the page
/// layout are fixed; the four tokens are filled by [`fill`].
pub const SKELETON: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<office:document xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0"
    xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"
    xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0"
    xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0"
    xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0"
    xmlns:number="urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0"
    xmlns:presentation="urn:oasis:names:tc:opendocument:xmlns:presentation:1.0"
    xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0"
    xmlns:smil="urn:oasis:names:tc:opendocument:xmlns:smil-compatible:1.0"
    xmlns:anim="urn:oasis:names:tc:opendocument:xmlns:animation:1.0"
    xmlns:ooo="http://openoffice.org/2004/office"
    office:version="1.2"
    office:mimetype="application/vnd.oasis.opendocument.presentation">
  <office:meta>
    <dc:title>{TITLE}</dc:title>
    <meta:creation-date>{CREATION_DATE}</meta:creation-date>
    <dc:creator>{AUTHOR}</dc:creator>
    <meta:generator>deck-fodp</meta:generator>
  </office:meta>
  <office:styles>
    <style:style style:name="dp1" style:family="drawing-page">
      <style:drawing-page-properties presentation:background-visible="true" presentation:background-objects-visible="true"/>
    </style:style>
    <style:style style:name="DefaultTextStyle" style:family="paragraph">
      <style:paragraph-properties fo:text-align="start"/>
      <style:text-properties fo:font-size="18pt" fo:font-family="Arial"/>
    </style:style>
  </office:styles>
  <office:automatic-styles>
    <style:page-layout style:name="PM1">
      <style:page-layout-properties fo:margin-top="0cm" fo:margin-bottom="0cm" fo:margin-left="0cm" fo:margin-right="0cm" fo:page-width="28cm" fo:page-height="21cm" style:print-orientation="landscape"/>
    </style:page-layout>
  </office:automatic-styles>
  <office:master-styles>
    <style:master-page style:name="Default" style:page-layout-name="PM1" draw:style-name="dp1"/>
  </office:master-styles>
  <office:body>
    <office:presentation>
{SLIDES}
    </office:presentation>
  </office:body>
</office:document>
"##;

/// Substitute `{TOKEN}` placeholders in one pass.
///
/// Substituted values are never rescanned, so a title that happens to
/// contain `{SLIDES}` stays literal. Unknown tokens are left untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(token, _)| tail.starts_with(token)) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
