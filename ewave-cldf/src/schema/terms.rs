//! CLDF ontology terms for well-known column names.

pub const CLDF_NS: &str = "http://cldf.clld.org/v1.0/terms.rdf#";

/// Column name → CLDF term.
const COLUMN_TERMS: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Name", "name"),
    ("Description", "description"),
    ("Comment", "comment"),
    ("Value", "value"),
    ("Source", "source"),
    ("Glottocode", "glottocode"),
    ("ISO639P3code", "iso639P3code"),
    ("Macroarea", "macroarea"),
    ("Latitude", "latitude"),
    ("Longitude", "longitude"),
    ("Language_ID", "languageReference"),
    ("Parameter_ID", "parameterReference"),
    ("Code_ID", "codeReference"),
    ("Example_ID", "exampleReference"),
    ("Contribution_ID", "contributionReference"),
    ("Primary_Text", "primaryText"),
    ("Analyzed_Word", "analyzedWord"),
    ("Gloss", "gloss"),
    ("Translated_Text", "translatedText"),
];

pub fn term_url(term: &str) -> String {
    format!("{}{}", CLDF_NS, term)
}

/// The `propertyUrl` a column of this name gets in CLDF, if any.
pub fn property_url(column: &str) -> Option<String> {
    COLUMN_TERMS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, term)| term_url(term))
}

/// URI for a CLDF module or component (`StructureDataset`, `LanguageTable`).
pub fn conforms_to(component: &str) -> String {
    term_url(component)
}
