//! Fixed companion parts of the container
//!
//! Everything in the package except the worksheet itself: manifest,
//! relationships, document properties and styles. These are copied into the
//! archive byte-for-byte; nothing here depends on the rows written.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use super::encoder::write_escaped_lossy;

/// Entry name of the generated worksheet. Never supplied as an asset.
pub const WORKSHEET_ENTRY: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>xlsxstream</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop><LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>1.0</AppVersion></Properties>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Ordered mapping of archive entry name to literal bytes.
///
/// Entries are written in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedAssets {
    entries: IndexMap<String, Vec<u8>>,
}

impl FixedAssets {
    /// An empty set. The caller must supply every part the package needs.
    pub fn new() -> Self {
        Self::default()
    }

    /// The parts a one-sheet workbook named `Sheet1` needs, stamped with the
    /// current time.
    pub fn standard() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FixedAssetsBuilder {
        FixedAssetsBuilder::default()
    }

    /// Add or replace an entry, returning the bytes it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Option<Vec<u8>> {
        self.entries.insert(name.into(), bytes.into())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }
}

/// Builder for [`FixedAssets::standard`] with a custom sheet name or timestamp.
#[derive(Debug, Clone)]
pub struct FixedAssetsBuilder {
    sheet_name: String,
    created: Option<DateTime<Utc>>,
    creator: String,
}

impl Default for FixedAssetsBuilder {
    fn default() -> Self {
        FixedAssetsBuilder {
            sheet_name: "Sheet1".to_string(),
            created: None,
            creator: "xlsxstream".to_string(),
        }
    }
}

impl FixedAssetsBuilder {
    /// Tab name shown for the worksheet.
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Creation time recorded in the document properties. Fixing it makes the
    /// whole archive reproducible.
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn build(self) -> FixedAssets {
        let created = self
            .created
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut assets = FixedAssets::new();
        assets.insert("[Content_Types].xml", CONTENT_TYPES);
        assets.insert("_rels/.rels", ROOT_RELS);
        assets.insert("docProps/app.xml", APP_PROPS);
        assets.insert("docProps/core.xml", core_props(&self.creator, &created));
        assets.insert("xl/workbook.xml", workbook_xml(&self.sheet_name));
        assets.insert("xl/_rels/workbook.xml.rels", WORKBOOK_RELS);
        assets.insert("xl/styles.xml", STYLES);
        assets
    }
}

fn core_props(creator: &str, created: &str) -> Vec<u8> {
    let mut xml = Vec::with_capacity(640);
    xml.extend_from_slice(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator>"#,
    );
    write_escaped_lossy(&mut xml, creator);
    xml.extend_from_slice(b"</dc:creator><cp:lastModifiedBy>");
    write_escaped_lossy(&mut xml, creator);
    xml.extend_from_slice(b"</cp:lastModifiedBy><dcterms:created xsi:type=\"dcterms:W3CDTF\">");
    xml.extend_from_slice(created.as_bytes());
    xml.extend_from_slice(b"</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">");
    xml.extend_from_slice(created.as_bytes());
    xml.extend_from_slice(b"</dcterms:modified></cp:coreProperties>");
    xml
}

fn workbook_xml(sheet_name: &str) -> Vec<u8> {
    let mut xml = Vec::with_capacity(512);
    xml.extend_from_slice(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name=""#,
    );
    write_escaped_lossy(&mut xml, sheet_name);
    xml.extend_from_slice(br#"" sheetId="1" r:id="rId1"/></sheets></workbook>"#);
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_standard_parts() {
        let assets = FixedAssets::standard();
        let names: Vec<&str> = assets.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/app.xml",
                "docProps/core.xml",
                "xl/workbook.xml",
                "xl/_rels/workbook.xml.rels",
                "xl/styles.xml",
            ]
        );
        assert!(!assets.contains(WORKSHEET_ENTRY));
    }

    #[test]
    fn test_sheet_name_is_escaped() {
        let assets = FixedAssets::builder().sheet_name("Q1 & \"Q2\"").build();
        let workbook = String::from_utf8(assets.get("xl/workbook.xml").unwrap().to_vec()).unwrap();
        assert!(workbook
            .contains(r#"<sheet name="Q1 &amp; &#34;Q2&#34;" sheetId="1" r:id="rId1"/>"#));
    }

    #[test]
    fn test_fixed_timestamp_is_reproducible() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let first = FixedAssets::builder().created(at).build();
        let second = FixedAssets::builder().created(at).build();
        assert_eq!(first, second);

        let core = String::from_utf8(first.get("docProps/core.xml").unwrap().to_vec()).unwrap();
        assert!(core.contains(
            "<dcterms:created xsi:type=\"dcterms:W3CDTF\">2024-01-01T00:00:00Z</dcterms:created>"
        ));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut assets = FixedAssets::standard();
        let old = assets.insert("xl/styles.xml", b"<styleSheet/>".to_vec());
        assert!(old.is_some());
        assert_eq!(assets.len(), 7);
        assert_eq!(assets.get("xl/styles.xml"), Some(&b"<styleSheet/>"[..]));
        assert_eq!(assets.iter().last().map(|(name, _)| name), Some("xl/styles.xml"));
    }
}
