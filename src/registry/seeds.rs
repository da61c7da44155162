//! Static keyword → coding tables (spec.md §4.1). Keywords are
//! lowercase; matching normalizes the haystack the same way.

use super::CodingSeed;
use crate::schema::Category;

const LOINC: &str = "http://loinc.org";
const ICD10_CM: &str = "http://hl7.org/fhir/sid/icd-10-cm";
const SNOMED: &str = "http://snomed.info/sct";
const RXNORM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";
const CPT: &str = "http://www.ama-assn.org/go/cpt";
const CVX: &str = "http://hl7.org/fhir/sid/cvx";

pub(super) fn table_for(category: Category) -> &'static [CodingSeed] {
    match category {
        Category::Demographics => &[],
        Category::Condition => CONDITION,
        Category::Observation => OBSERVATION,
        Category::Medication | Category::MedicationRequest => MEDICATION,
        Category::Allergy => ALLERGY,
        Category::Procedure => PROCEDURE,
        Category::DiagnosticReport => DIAGNOSTIC_REPORT,
        Category::Immunization => IMMUNIZATION,
        Category::PerformanceStatus => PERFORMANCE_STATUS,
    }
}

const CONDITION: &[CodingSeed] = &[
    CodingSeed {
        keyword: "type 2 diabetes",
        system: ICD10_CM,
        code: "E11",
        display: "Type 2 diabetes mellitus",
    },
    CodingSeed {
        keyword: "type 1 diabetes",
        system: ICD10_CM,
        code: "E10",
        display: "Type 1 diabetes mellitus",
    },
    CodingSeed {
        keyword: "diabetes",
        system: ICD10_CM,
        code: "E11.9",
        display: "Diabetes mellitus, unspecified",
    },
    CodingSeed {
        keyword: "pre-diabetes",
        system: ICD10_CM,
        code: "R73.03",
        display: "Prediabetes",
    },
    CodingSeed {
        keyword: "prediabetes",
        system: ICD10_CM,
        code: "R73.03",
        display: "Prediabetes",
    },
    CodingSeed {
        keyword: "hypertension",
        system: ICD10_CM,
        code: "I10",
        display: "Essential (primary) hypertension",
    },
    CodingSeed {
        keyword: "chronic kidney disease",
        system: ICD10_CM,
        code: "N18.9",
        display: "Chronic kidney disease, unspecified",
    },
    CodingSeed {
        keyword: "heart failure",
        system: ICD10_CM,
        code: "I50.9",
        display: "Heart failure, unspecified",
    },
    CodingSeed {
        keyword: "atrial fibrillation",
        system: ICD10_CM,
        code: "I48.91",
        display: "Unspecified atrial fibrillation",
    },
    CodingSeed {
        keyword: "non-small cell lung cancer",
        system: ICD10_CM,
        code: "C34.90",
        display: "Malignant neoplasm of lung, unspecified",
    },
    CodingSeed {
        keyword: "breast cancer",
        system: ICD10_CM,
        code: "C50.919",
        display: "Malignant neoplasm of breast, unspecified",
    },
    CodingSeed {
        keyword: "metastatic colorectal cancer",
        system: ICD10_CM,
        code: "C78.5",
        display: "Secondary malignant neoplasm of large intestine and rectum",
    },
    CodingSeed {
        keyword: "pregnant",
        system: SNOMED,
        code: "77386006",
        display: "Patient currently pregnant",
    },
    CodingSeed {
        keyword: "breastfeeding",
        system: SNOMED,
        code: "169826009",
        display: "Breastfeeding",
    },
    CodingSeed {
        keyword: "hiv",
        system: ICD10_CM,
        code: "B20",
        display: "Human immunodeficiency virus [HIV] disease",
    },
];

const OBSERVATION: &[CodingSeed] = &[
    CodingSeed {
        keyword: "hba1c",
        system: LOINC,
        code: "4548-4",
        display: "Hemoglobin A1c/Hemoglobin.total in Blood",
    },
    CodingSeed {
        keyword: "hemoglobin a1c",
        system: LOINC,
        code: "4548-4",
        display: "Hemoglobin A1c/Hemoglobin.total in Blood",
    },
    CodingSeed {
        keyword: "egfr",
        system: LOINC,
        code: "33914-3",
        display: "Glomerular filtration rate/1.73 sq M.predicted",
    },
    CodingSeed {
        keyword: "estimated glomerular filtration rate",
        system: LOINC,
        code: "33914-3",
        display: "Glomerular filtration rate/1.73 sq M.predicted",
    },
    CodingSeed {
        keyword: "systolic blood pressure",
        system: LOINC,
        code: "8480-6",
        display: "Systolic blood pressure",
    },
    CodingSeed {
        keyword: "blood pressure",
        system: LOINC,
        code: "85354-9",
        display: "Blood pressure panel",
    },
    CodingSeed {
        keyword: "body mass index",
        system: LOINC,
        code: "39156-5",
        display: "Body mass index (BMI) [Ratio]",
    },
    CodingSeed {
        keyword: "bmi",
        system: LOINC,
        code: "39156-5",
        display: "Body mass index (BMI) [Ratio]",
    },
    CodingSeed {
        keyword: "absolute neutrophil count",
        system: LOINC,
        code: "751-8",
        display: "Neutrophils [#/volume] in Blood by Automated count",
    },
    CodingSeed {
        keyword: "platelet count",
        system: LOINC,
        code: "777-3",
        display: "Platelets [#/volume] in Blood by Automated count",
    },
    CodingSeed {
        keyword: "creatinine",
        system: LOINC,
        code: "2160-0",
        display: "Creatinine [Mass/volume] in Serum or Plasma",
    },
    CodingSeed {
        keyword: "ecog",
        system: LOINC,
        code: "89247-1",
        display: "ECOG Performance Status score",
    },
    CodingSeed {
        keyword: "karnofsky",
        system: LOINC,
        code: "89243-0",
        display: "Karnofsky Performance Status score",
    },
];

const PERFORMANCE_STATUS: &[CodingSeed] = &[
    CodingSeed {
        keyword: "ecog performance status",
        system: LOINC,
        code: "89247-1",
        display: "ECOG Performance Status score",
    },
    CodingSeed {
        keyword: "ecog",
        system: LOINC,
        code: "89247-1",
        display: "ECOG Performance Status score",
    },
    CodingSeed {
        keyword: "karnofsky performance status",
        system: LOINC,
        code: "89243-0",
        display: "Karnofsky Performance Status score",
    },
    CodingSeed {
        keyword: "karnofsky",
        system: LOINC,
        code: "89243-0",
        display: "Karnofsky Performance Status score",
    },
];

const MEDICATION: &[CodingSeed] = &[
    CodingSeed {
        keyword: "metformin",
        system: RXNORM,
        code: "6809",
        display: "metformin",
    },
    CodingSeed {
        keyword: "warfarin",
        system: RXNORM,
        code: "11289",
        display: "warfarin",
    },
    CodingSeed {
        keyword: "insulin",
        system: RXNORM,
        code: "5856",
        display: "insulin",
    },
    CodingSeed {
        keyword: "atorvastatin",
        system: RXNORM,
        code: "83367",
        display: "atorvastatin",
    },
    CodingSeed {
        keyword: "simvastatin",
        system: RXNORM,
        code: "36567",
        display: "simvastatin",
    },
    CodingSeed {
        keyword: "statin",
        system: RXNORM,
        code: "N0000175503",
        display: "HMG-CoA reductase inhibitor (statin) class",
    },
    CodingSeed {
        keyword: "pembrolizumab",
        system: RXNORM,
        code: "1547545",
        display: "pembrolizumab",
    },
    CodingSeed {
        keyword: "osimertinib",
        system: RXNORM,
        code: "1719293",
        display: "osimertinib",
    },
    CodingSeed {
        keyword: "aspirin",
        system: RXNORM,
        code: "1191",
        display: "aspirin",
    },
    CodingSeed {
        keyword: "lisinopril",
        system: RXNORM,
        code: "29046",
        display: "lisinopril",
    },
];

const ALLERGY: &[CodingSeed] = &[
    CodingSeed {
        keyword: "penicillin",
        system: SNOMED,
        code: "764146007",
        display: "Penicillin",
    },
    CodingSeed {
        keyword: "sulfa",
        system: SNOMED,
        code: "387207008",
        display: "Sulfonamide",
    },
    CodingSeed {
        keyword: "latex",
        system: SNOMED,
        code: "111088007",
        display: "Latex",
    },
    CodingSeed {
        keyword: "peanut",
        system: SNOMED,
        code: "91935009",
        display: "Peanut",
    },
    CodingSeed {
        keyword: "shellfish",
        system: SNOMED,
        code: "735996008",
        display: "Shellfish",
    },
    CodingSeed {
        keyword: "contrast media",
        system: SNOMED,
        code: "293586001",
        display: "Contrast media allergy",
    },
];

const PROCEDURE: &[CodingSeed] = &[
    CodingSeed {
        keyword: "coronary artery bypass graft",
        system: CPT,
        code: "33533",
        display: "Coronary artery bypass, using arterial graft",
    },
    CodingSeed {
        keyword: "cabg",
        system: CPT,
        code: "33533",
        display: "Coronary artery bypass, using arterial graft",
    },
    CodingSeed {
        keyword: "percutaneous coronary intervention",
        system: CPT,
        code: "92928",
        display: "Percutaneous transcatheter placement of intracoronary stent",
    },
    CodingSeed {
        keyword: "appendectomy",
        system: CPT,
        code: "44970",
        display: "Laparoscopy, surgical, appendectomy",
    },
    CodingSeed {
        keyword: "hip replacement",
        system: CPT,
        code: "27130",
        display: "Arthroplasty, acetabular and proximal femoral prosthetic replacement",
    },
    CodingSeed {
        keyword: "radiation therapy",
        system: SNOMED,
        code: "108290001",
        display: "Radiation oncology treatment",
    },
];

const DIAGNOSTIC_REPORT: &[CodingSeed] = &[
    CodingSeed {
        keyword: "ct chest",
        system: LOINC,
        code: "24627-2",
        display: "CT Chest",
    },
    CodingSeed {
        keyword: "ct abdomen",
        system: LOINC,
        code: "24558-9",
        display: "CT Abdomen",
    },
    CodingSeed {
        keyword: "pet scan",
        system: LOINC,
        code: "44139-4",
        display: "PET Whole body",
    },
    CodingSeed {
        keyword: "pet",
        system: LOINC,
        code: "44139-4",
        display: "PET Whole body",
    },
    CodingSeed {
        keyword: "mri brain",
        system: LOINC,
        code: "24590-2",
        display: "MRI Brain",
    },
    CodingSeed {
        keyword: "echocardiogram",
        system: LOINC,
        code: "34552-0",
        display: "Echocardiography study",
    },
];

const IMMUNIZATION: &[CodingSeed] = &[
    CodingSeed {
        keyword: "influenza",
        system: CVX,
        code: "88",
        display: "influenza virus vaccine",
    },
    CodingSeed {
        keyword: "covid-19",
        system: CVX,
        code: "208",
        display: "COVID-19 vaccine",
    },
    CodingSeed {
        keyword: "covid",
        system: CVX,
        code: "208",
        display: "COVID-19 vaccine",
    },
    CodingSeed {
        keyword: "hepatitis b",
        system: CVX,
        code: "08",
        display: "hepatitis B vaccine",
    },
    CodingSeed {
        keyword: "mmr",
        system: CVX,
        code: "03",
        display: "measles, mumps and rubella virus vaccine",
    },
    CodingSeed {
        keyword: "tetanus",
        system: CVX,
        code: "09",
        display: "tetanus toxoid vaccine",
    },
];
