//! Shared fixtures for trialmoa tests: a sample vocabulary and row builders.

pub use pretty_assertions::{assert_eq, assert_ne};

use trialmoa_common::{RawRow, Vocabulary};

/// Small oncology/immunology vocabulary exercising every pattern kind.
pub const SAMPLE_VOCABULARY_YAML: &str = r#"
drug_synonyms:
  Tarceva: erlotinib
  Herceptin: trastuzumab
  Rituxan: rituximab
  MabThera: rituximab
  Keytruda: pembrolizumab
  Opdivo: nivolumab
  Humira: adalimumab
  Avastin: bevacizumab
  Imbruvica: ibrutinib

targets:
  EGFR: [egfr, erbb1, her1, epidermal growth factor receptor]
  HER2: [her2, erbb2, neu]
  CD20: [cd20, ms4a1]
  PD-1: [pd-1, pdcd1, programmed death-1]
  VEGF: [vegf, vegf-a, vascular endothelial growth factor]
  TNF: [tnf, tnf-alpha, tumor necrosis factor]
  IL-17: [il-17, il-17a, interleukin-17]
  BCMA: [bcma, tnfrsf17]
  BTK: [btk, bruton tyrosine kinase]
  JAK: [jak, jak1, jak2, janus kinase]
  Protein kinase: [kinase]

moa_categories:
  - tyrosine kinase inhibitor
  - kinase inhibitor
  - monoclonal antibody
  - CAR-T cell therapy
  - small molecule inhibitor

rules:
  - name: egfr-tki
    all: [egfr, tyrosine kinase inhibitor]
    target: EGFR
    moa: tyrosine kinase inhibitor
  - name: egfr-antibody
    any: [cetuximab, panitumumab]
    target: EGFR
    moa: monoclonal antibody
  - name: her2-antibody
    any: [trastuzumab, pertuzumab]
    target: HER2
    moa: monoclonal antibody
  - name: bcma-car-t
    regex: '\bbcma\b.*\bcar[-\s]?t\b|\bcar[-\s]?t\b.*\bbcma\b'
    target: BCMA
    moa: CAR-T cell therapy
  - name: cd20-antibody
    regex: '\b(anti[-\s]?cd20|rituximab|obinutuzumab)\b'
    target: CD20
    moa: monoclonal antibody
  - name: pd1-antibody
    regex: '\b(anti[-\s]?pd[-\s]?1|pembrolizumab|nivolumab)\b'
    target: PD-1
    moa: monoclonal antibody
  - name: tnf-antibody
    any: [adalimumab, infliximab, anti-tnf]
    target: TNF
    moa: monoclonal antibody
  - name: vegf-antibody
    keyword: bevacizumab
    target: VEGF
    moa: monoclonal antibody
  - name: il17-mention
    mentions_target: IL-17
    target: IL-17
    moa: monoclonal antibody
  - name: btk-mention
    mentions_target: BTK
    target: BTK
    moa: kinase inhibitor
  - name: jak-mention
    mentions_target: JAK
    target: JAK
    moa: kinase inhibitor
  - name: generic-kinase
    keyword: kinase
    target: Protein kinase
    moa: kinase inhibitor

innovation:
  entries:
    - target: EGFR
      moa: tyrosine kinase inhibitor
      status: ESTABLISHED
    - target: EGFR
      status: ESTABLISHED
    - target: HER2
      status: ESTABLISHED
    - target: CD20
      status: ESTABLISHED
    - target: PD-1
      status: ESTABLISHED
    - target: TNF
      status: ESTABLISHED
    - target: VEGF
      status: ESTABLISHED
    - target: BTK
      status: ESTABLISHED
  first_in_class:
    drugs: [xr-9921]
    targets: [IL-17]
  approvals:
    BCMA: 2021
    JAK: 2011
  reference_year: 2024
"#;

/// The sample vocabulary, parsed and validated.
pub fn sample_vocabulary() -> Vocabulary {
    let vocabulary = Vocabulary::from_yaml_str(SAMPLE_VOCABULARY_YAML)
        .expect("sample vocabulary must parse");
    vocabulary.validate().expect("sample vocabulary must validate");
    vocabulary
}

/// Builder for loader rows using the default column names.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    row: RawRow,
}

impl RowBuilder {
    pub fn new(row_number: usize) -> Self {
        Self { row: RawRow::new(row_number) }
    }

    pub fn id(self, v: &str) -> Self { self.set("id", v) }
    pub fn drug(self, v: &str) -> Self { self.set("drug_name", v) }
    pub fn description(self, v: &str) -> Self { self.set("description", v) }
    pub fn condition(self, v: &str) -> Self { self.set("condition", v) }
    pub fn phase(self, v: &str) -> Self { self.set("phase", v) }
    pub fn sponsor(self, v: &str) -> Self { self.set("sponsor", v) }
    pub fn title(self, v: &str) -> Self { self.set("title", v) }
    pub fn treatment_plan(self, v: &str) -> Self { self.set("treatment_plan", v) }

    pub fn set(mut self, column: &str, value: &str) -> Self {
        self.row = self.row.with(column, value);
        self
    }

    pub fn build(self) -> RawRow {
        self.row
    }
}

/// The Erlotinib row from the end-to-end scenario.
pub fn erlotinib_row(row_number: usize) -> RawRow {
    RowBuilder::new(row_number)
        .id("NCT00000001")
        .drug("Erlotinib")
        .description("EGFR tyrosine kinase inhibitor")
        .phase("III")
        .build()
}

/// The unmatched first-in-class row from the end-to-end scenario.
pub fn unmatched_row(row_number: usize) -> RawRow {
    RowBuilder::new(row_number)
        .id("NCT00000002")
        .drug("XR-9921")
        .description("first-in-class allosteric modulator of novel target Z")
        .build()
}

/// Ten rows; row 5 has no identifier.
pub fn batch_with_malformed_fifth() -> Vec<RawRow> {
    let drugs = [
        ("Erlotinib", "EGFR tyrosine kinase inhibitor"),
        ("Herceptin", "HER2-directed antibody"),
        ("Rituximab", "anti-CD20 monoclonal antibody"),
        ("Keytruda", "anti-PD-1 antibody"),
        ("Broken", "this row has no identifier"),
        ("XR-9921", "first-in-class allosteric modulator of novel target Z"),
        ("Avastin", "anti-VEGF antibody"),
        ("Ibrutinib", "covalent BTK inhibitor"),
        ("Secukinumab", "anti-IL-17A antibody"),
        ("Tofacitinib", "JAK inhibitor"),
    ];

    drugs
        .iter()
        .enumerate()
        .map(|(i, (drug, description))| {
            let n = i + 1;
            let builder = RowBuilder::new(n).drug(drug).description(description).phase("II");
            if n == 5 {
                builder.build()
            } else {
                builder.id(&format!("NCT{n:08}")).build()
            }
        })
        .collect()
}
