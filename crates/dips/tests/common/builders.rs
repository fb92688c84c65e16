//! Builders for METS manifests.
//!
//! The generated documents use the same namespaces and nesting as
//! Archivematica DIP manifests, so ingestion runs through prefix stripping
//! and the real element paths.

#![allow(dead_code)]

use std::fmt::Write;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A PREMIS event attached to a file.
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub uuid: String,
    pub eventtype: String,
    pub datetime: String,
    pub detail: String,
    pub outcome: String,
    pub note: String,
}

impl EventSpec {
    pub fn new(uuid: &str, eventtype: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            eventtype: eventtype.to_string(),
            datetime: "2017-08-15T00:30:55".to_string(),
            detail: format!("program=\"{}\"", eventtype),
            outcome: "pass".to_string(),
            note: String::new(),
        }
    }

    pub fn outcome(mut self, outcome: &str) -> Self {
        self.outcome = outcome.to_string();
        self
    }

    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }
}

/// An original file with its technical metadata.
#[derive(Debug, Clone)]
pub struct FileSpec {
    pub uuid: String,
    pub name: String,
    pub size: String,
    pub format: String,
    pub version: String,
    pub puid: String,
    pub hashtype: String,
    pub hashvalue: String,
    pub modified: Option<String>,
    pub events: Vec<EventSpec>,
}

impl FileSpec {
    pub fn new(uuid: &str, name: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: name.to_string(),
            size: "1536".to_string(),
            format: "Plain Text File".to_string(),
            version: String::new(),
            puid: "x-fmt/111".to_string(),
            hashtype: "sha256".to_string(),
            hashvalue: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                .to_string(),
            modified: Some("1502757055000".to_string()),
            events: Vec::new(),
        }
    }

    pub fn size(mut self, size: &str) -> Self {
        self.size = size.to_string();
        self
    }

    pub fn format(mut self, format: &str, version: &str, puid: &str) -> Self {
        self.format = format.to_string();
        self.version = version.to_string();
        self.puid = puid.to_string();
        self
    }

    pub fn hash(mut self, hashtype: &str, hashvalue: &str) -> Self {
        self.hashtype = hashtype.to_string();
        self.hashvalue = hashvalue.to_string();
        self
    }

    pub fn modified(mut self, modified: Option<&str>) -> Self {
        self.modified = modified.map(str::to_string);
        self
    }

    pub fn event(mut self, event: EventSpec) -> Self {
        self.events.push(event);
        self
    }
}

/// A Dublin Core `dmdSec`.
#[derive(Debug, Clone)]
pub struct DcSpec {
    pub id: String,
    pub created: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl DcSpec {
    pub fn new(id: &str, created: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            created: created.map(str::to_string),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }
}

/// Builder for a complete METS document.
#[derive(Debug, Clone, Default)]
pub struct MetsBuilder {
    files: Vec<FileSpec>,
    sections: Vec<DcSpec>,
    referenced: Vec<String>,
}

impl MetsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file: FileSpec) -> Self {
        self.files.push(file);
        self
    }

    /// Adds a DC section referenced by the objects directory.
    pub fn dublin_core(mut self, section: DcSpec) -> Self {
        self.referenced.push(section.id.clone());
        self.sections.push(section);
        self
    }

    /// Adds a DC section that no structMap div points to.
    pub fn unreferenced_dublin_core(mut self, section: DcSpec) -> Self {
        self.sections.push(section);
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str(
            r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:premis="info:lc/xmlns/premis-v2" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:fits="http://hul.harvard.edu/ois/xml/ns/fits/fits_output" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        );
        xml.push_str(r#"<mets:metsHdr CREATEDATE="2017-08-15T00:31:00"/>"#);

        for section in &self.sections {
            let created = section
                .created
                .as_ref()
                .map(|c| format!(r#" CREATED="{}""#, c))
                .unwrap_or_default();
            let _ = write!(
                xml,
                r#"<mets:dmdSec ID="{}"{}><mets:mdWrap MDTYPE="DC"><mets:xmlData><dcterms:dublincore>"#,
                section.id, created
            );
            for (name, value) in &section.fields {
                let _ = write!(xml, "<dc:{0}>{1}</dc:{0}>", name, escape(value));
            }
            xml.push_str("</dcterms:dublincore></mets:xmlData></mets:mdWrap></mets:dmdSec>");
        }

        for (i, file) in self.files.iter().enumerate() {
            write_amdsec(&mut xml, i + 1, file);
        }

        xml.push_str(r#"<mets:fileSec><mets:fileGrp USE="original">"#);
        for (i, file) in self.files.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<mets:file ID="file-{0}" GROUPID="Group-{0}" ADMID="amdSec_{1}"><mets:FLocat xlink:href="objects/{2}" LOCTYPE="OTHER" OTHERLOCTYPE="SYSTEM"/></mets:file>"#,
                file.uuid,
                i + 1,
                escape(&file.name)
            );
        }
        xml.push_str(r#"</mets:fileGrp><mets:fileGrp USE="preservation"/></mets:fileSec>"#);

        let dmdid = if self.referenced.is_empty() {
            String::new()
        } else {
            format!(r#" DMDID="{}""#, self.referenced.join(" "))
        };
        let _ = write!(
            xml,
            r#"<mets:structMap TYPE="physical" ID="structMap_1"><mets:div TYPE="Directory" LABEL="package"><mets:div TYPE="Directory" LABEL="objects"{}/></mets:div></mets:structMap>"#,
            dmdid
        );
        xml.push_str("</mets:mets>");
        xml
    }
}

fn write_amdsec(xml: &mut String, n: usize, file: &FileSpec) {
    let _ = write!(xml, r#"<mets:amdSec ID="amdSec_{}">"#, n);
    let _ = write!(
        xml,
        r#"<mets:techMD ID="techMD_{}"><mets:mdWrap MDTYPE="PREMIS:OBJECT"><mets:xmlData><premis:object>"#,
        n
    );
    let _ = write!(
        xml,
        "<premis:objectIdentifier><premis:objectIdentifierType>UUID</premis:objectIdentifierType>\
         <premis:objectIdentifierValue>{}</premis:objectIdentifierValue></premis:objectIdentifier>",
        file.uuid
    );
    xml.push_str("<premis:objectCharacteristics><premis:compositionLevel>0</premis:compositionLevel>");
    let _ = write!(
        xml,
        "<premis:fixity><premis:messageDigestAlgorithm>{}</premis:messageDigestAlgorithm>\
         <premis:messageDigest>{}</premis:messageDigest></premis:fixity>",
        escape(&file.hashtype),
        escape(&file.hashvalue)
    );
    let _ = write!(xml, "<premis:size>{}</premis:size>", escape(&file.size));
    let _ = write!(
        xml,
        "<premis:format><premis:formatDesignation><premis:formatName>{}</premis:formatName>\
         <premis:formatVersion>{}</premis:formatVersion></premis:formatDesignation>\
         <premis:formatRegistry><premis:formatRegistryName>PRONOM</premis:formatRegistryName>\
         <premis:formatRegistryKey>{}</premis:formatRegistryKey></premis:formatRegistry></premis:format>",
        escape(&file.format),
        escape(&file.version),
        escape(&file.puid)
    );
    xml.push_str("<premis:objectCharacteristicsExtension><fits:fits><fits:fileinfo>");
    if let Some(modified) = &file.modified {
        let _ = write!(
            xml,
            r#"<fits:fslastmodified toolname="OIS File Information" toolversion="0.2">{}</fits:fslastmodified>"#,
            escape(modified)
        );
    }
    let _ = write!(
        xml,
        r#"<fits:fslastmodified toolname="Exiftool" toolversion="9.13">0</fits:fslastmodified>"#
    );
    xml.push_str("</fits:fileinfo></fits:fits></premis:objectCharacteristicsExtension>");
    xml.push_str("</premis:objectCharacteristics>");
    let _ = write!(
        xml,
        "<premis:originalName>%transferDirectory%objects/{}</premis:originalName>",
        escape(&file.name)
    );
    xml.push_str("</premis:object></mets:xmlData></mets:mdWrap></mets:techMD>");

    for (j, event) in file.events.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<mets:digiprovMD ID="digiprovMD_{}_{}"><mets:mdWrap MDTYPE="PREMIS:EVENT"><mets:xmlData><premis:event>"#,
            n,
            j + 1
        );
        let _ = write!(
            xml,
            "<premis:eventIdentifier><premis:eventIdentifierType>UUID</premis:eventIdentifierType>\
             <premis:eventIdentifierValue>{}</premis:eventIdentifierValue></premis:eventIdentifier>\
             <premis:eventType>{}</premis:eventType><premis:eventDateTime>{}</premis:eventDateTime>\
             <premis:eventDetail>{}</premis:eventDetail>\
             <premis:eventOutcomeInformation><premis:eventOutcome>{}</premis:eventOutcome>\
             <premis:eventOutcomeDetail><premis:eventOutcomeDetailNote>{}</premis:eventOutcomeDetailNote>\
             </premis:eventOutcomeDetail></premis:eventOutcomeInformation>",
            event.uuid,
            escape(&event.eventtype),
            escape(&event.datetime),
            escape(&event.detail),
            escape(&event.outcome),
            escape(&event.note)
        );
        xml.push_str("</premis:event></mets:xmlData></mets:mdWrap></mets:digiprovMD>");
    }

    let _ = write!(
        xml,
        r#"<mets:digiprovMD ID="digiprovMD_{}_agent"><mets:mdWrap MDTYPE="PREMIS:AGENT"><mets:xmlData><premis:agent><premis:agentName>Archivematica</premis:agentName></premis:agent></mets:xmlData></mets:mdWrap></mets:digiprovMD>"#,
        n
    );
    xml.push_str("</mets:amdSec>");
}
