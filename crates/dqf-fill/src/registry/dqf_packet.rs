//! Placement table for the 25-page driver qualification packet (Letter, PDF points)
//!
//! Coordinates were measured against the packet template; any change to the
//! template's page order or box positions means re-deriving this table.

use super::FieldRegistry;
use dqf_types::{CoordinateSpace, FieldDefinition};
use lazy_static::lazy_static;

pub const PACKET_PAGE_COUNT: u32 = 25;

/// Road test certificate, road test record, annual driving record review,
/// and the inquiry to state agencies are completed by the carrier.
const INTERNAL_PAGES: [u32; 4] = [14, 15, 16, 24];

lazy_static! {
    static ref DQF_PACKET: FieldRegistry = FieldRegistry::new(
        CoordinateSpace::PdfPoints,
        packet_fields(),
        INTERNAL_PAGES,
    )
    .expect("built-in DQF registry must have unique ids and 1-indexed pages");
}

/// The built-in registry for the driver qualification packet
pub fn dqf_packet() -> &'static FieldRegistry {
    &DQF_PACKET
}

fn text(id: &str, page: u32, x: f64, y: f64, width: f64) -> FieldDefinition {
    FieldDefinition::text(id, page, x, y, width)
}

fn date(id: &str, page: u32, x: f64, y: f64) -> FieldDefinition {
    FieldDefinition::date(id, page, x, y)
}

fn check(id: &str, page: u32, x: f64, y: f64) -> FieldDefinition {
    FieldDefinition::checkbox(id, page, x, y)
}

/// Yes/No checkbox pair sharing a row
fn yes_no(prefix: &str, page: u32, x: f64, y: f64) -> [FieldDefinition; 2] {
    [
        check(&format!("{}_yes", prefix), page, x, y),
        check(&format!("{}_no", prefix), page, x + 40.0, y),
    ]
}

/// Printed name, signature and date block at the foot of a consent page
fn signature_block(prefix: &str, page: u32) -> Vec<FieldDefinition> {
    vec![
        text(&format!("{}Name", prefix), page, 72.0, 150.0, 220.0),
        FieldDefinition::signature(format!("{}Signature", prefix), page, 72.0, 112.0, 220.0)
            .required(),
        date(&format!("{}Date", prefix), page, 380.0, 112.0).required(),
    ]
}

fn with_section(fields: Vec<FieldDefinition>, section: &str) -> Vec<FieldDefinition> {
    fields.into_iter().map(|f| f.section(section)).collect()
}

fn packet_fields() -> Vec<FieldDefinition> {
    let pages = [
        with_section(application_page(), "Application for Employment"),
        with_section(address_history_page(), "Address History"),
        with_section(employment_history_page(), "Employment History"),
        with_section(record_page(), "Accidents, Convictions and Felonies"),
        with_section(license_page(), "License Information"),
        with_section(experience_page(), "Driving Experience"),
        with_section(certification_page(), "Applicant Certification"),
        with_section(signature_block("fcra", 8), "FCRA Disclosure"),
        with_section(background_page(), "Background Check Authorization"),
        with_section(signature_block("psp", 10), "PSP Disclosure"),
        with_section(clearinghouse_page(), "Clearinghouse Consent"),
        with_section(drug_alcohol_inquiry_page(), "Drug and Alcohol Inquiry"),
        with_section(safety_history_page(), "Safety Performance History"),
        with_section(violations_page(), "Certification of Violations"),
        with_section(medical_page(), "Medical Examiner's Certificate"),
        with_section(signature_block("policy", 19), "Drug and Alcohol Policy Receipt"),
        with_section(signature_block("testConsent", 20), "Pre-Employment Test Consent"),
        with_section(on_duty_page(), "On-Duty Hours Statement"),
        with_section(other_work_page(), "Other Compensated Work"),
        with_section(eldt_page(), "Entry-Level Driver Training"),
        with_section(signature_block("ack", 25), "Applicant Acknowledgement"),
    ];
    pages.into_iter().flatten().collect()
}

fn application_page() -> Vec<FieldDefinition> {
    let mut fields = vec![
        text("firstName", 1, 72.0, 680.0, 130.0).required(),
        text("middleName", 1, 210.0, 680.0, 90.0),
        text("lastName", 1, 310.0, 680.0, 150.0).required(),
        date("dob", 1, 470.0, 680.0).required(),
        text("ssn", 1, 72.0, 652.0, 110.0).required(),
        text("phone", 1, 190.0, 652.0, 110.0).required(),
        text("email", 1, 310.0, 652.0, 230.0).required(),
        text("street", 1, 72.0, 624.0, 260.0).required(),
        text("city", 1, 340.0, 624.0, 120.0).required(),
        text("state", 1, 468.0, 624.0, 30.0).required(),
        text("zip", 1, 506.0, 624.0, 60.0).required(),
        text("yearsAtAddress", 1, 72.0, 596.0, 40.0),
        text("positionAppliedFor", 1, 130.0, 596.0, 150.0),
        date("dateAvailable", 1, 290.0, 596.0),
    ];
    fields.extend(yes_no("legallyAuthorized", 1, 430.0, 598.0));
    fields.extend(yes_no("englishProficient", 1, 430.0, 576.0));
    fields.push(date("applicationDate", 1, 72.0, 560.0).required());
    fields
}

fn address_history_page() -> Vec<FieldDefinition> {
    let mut fields = Vec::new();
    for i in 1..=3u32 {
        let y = 660.0 - f64::from(i - 1) * 80.0;
        fields.extend([
            text(&format!("prevStreet{}", i), 2, 72.0, y, 250.0),
            text(&format!("prevCity{}", i), 2, 330.0, y, 120.0),
            text(&format!("prevState{}", i), 2, 458.0, y, 30.0),
            text(&format!("prevZip{}", i), 2, 496.0, y, 60.0),
            date(&format!("prevFrom{}", i), 2, 72.0, y - 28.0),
            date(&format!("prevTo{}", i), 2, 200.0, y - 28.0),
        ]);
    }
    fields
}

fn employment_history_page() -> Vec<FieldDefinition> {
    let mut fields = Vec::new();
    for i in 1..=3u32 {
        let y = 680.0 - f64::from(i - 1) * 190.0;
        fields.extend([
            text(&format!("employerName{}", i), 3, 72.0, y, 230.0),
            text(&format!("employerPhone{}", i), 3, 320.0, y, 110.0),
            text(&format!("employerAddress{}", i), 3, 72.0, y - 28.0, 380.0),
            text(&format!("position{}", i), 3, 72.0, y - 56.0, 180.0),
            date(&format!("employedFrom{}", i), 3, 270.0, y - 56.0),
            date(&format!("employedTo{}", i), 3, 370.0, y - 56.0),
            text(&format!("reasonForLeaving{}", i), 3, 72.0, y - 100.0, 380.0).lines(2),
        ]);
        fields.extend(yes_no(&format!("fmcsrSubject{}", i), 3, 430.0, y - 130.0));
    }
    fields
}

fn record_page() -> Vec<FieldDefinition> {
    let mut fields = Vec::new();
    for i in 1..=2u32 {
        let y = 670.0 - f64::from(i - 1) * 28.0;
        fields.extend([
            date(&format!("accident{}Date", i), 4, 72.0, y),
            text(&format!("accident{}Nature", i), 4, 160.0, y, 220.0),
            text(&format!("accident{}Fatalities", i), 4, 390.0, y, 40.0),
            text(&format!("accident{}Injuries", i), 4, 440.0, y, 40.0),
        ]);
    }
    for i in 1..=2u32 {
        let y = 560.0 - f64::from(i - 1) * 28.0;
        fields.extend([
            date(&format!("conviction{}Date", i), 4, 72.0, y),
            text(&format!("conviction{}Location", i), 4, 160.0, y, 140.0),
            text(&format!("conviction{}Charge", i), 4, 310.0, y, 140.0),
            text(&format!("conviction{}Penalty", i), 4, 460.0, y, 90.0),
        ]);
    }
    fields.extend(yes_no("felony", 4, 400.0, 460.0));
    fields.push(text("felonyExplanation", 4, 72.0, 420.0, 470.0).lines(2));
    fields.extend(yes_no("licenseDenied", 4, 400.0, 380.0));
    fields.extend(yes_no("licenseSuspended", 4, 400.0, 356.0));
    fields.push(text("denialExplanation", 4, 72.0, 316.0, 470.0).lines(2));
    fields
}

fn license_page() -> Vec<FieldDefinition> {
    vec![
        text("cdlNumber", 5, 72.0, 680.0, 150.0).required(),
        text("cdlState", 5, 230.0, 680.0, 40.0).required(),
        text("cdlClass", 5, 280.0, 680.0, 40.0).required(),
        text("cdlEndorsements", 5, 330.0, 680.0, 100.0),
        date("cdlExpiration", 5, 440.0, 680.0).required(),
        text("license2Number", 5, 72.0, 652.0, 150.0),
        text("license2State", 5, 230.0, 652.0, 40.0),
        text("license2Class", 5, 280.0, 652.0, 40.0),
        date("license2Expiration", 5, 440.0, 652.0),
        date("medicalCardExpiration", 5, 72.0, 610.0),
    ]
}

fn experience_page() -> Vec<FieldDefinition> {
    let mut fields = Vec::new();
    let equipment = ["straightTruck", "tractorSemi", "tractorTwins", "otherEquipment"];
    for (i, kind) in equipment.iter().enumerate() {
        let y = 660.0 - i as f64 * 28.0;
        fields.extend([
            date(&format!("{}From", kind), 6, 200.0, y),
            date(&format!("{}To", kind), 6, 300.0, y),
            text(&format!("{}Miles", kind), 6, 400.0, y, 90.0),
        ]);
    }
    fields.extend([
        text("statesOperated", 6, 72.0, 520.0, 470.0).lines(2),
        text("trainingCourses", 6, 72.0, 470.0, 470.0),
        text("safeDrivingAwards", 6, 72.0, 442.0, 470.0),
    ]);
    fields
}

fn certification_page() -> Vec<FieldDefinition> {
    vec![
        text("certifyName", 7, 72.0, 200.0, 220.0).required(),
        FieldDefinition::signature("signature", 7, 72.0, 160.0, 240.0).required(),
        date("signatureDate", 7, 380.0, 160.0).required(),
    ]
}

fn background_page() -> Vec<FieldDefinition> {
    vec![
        text("bgFullName", 9, 72.0, 600.0, 220.0),
        text("bgOtherNames", 9, 300.0, 600.0, 240.0),
        date("bgDob", 9, 72.0, 572.0),
        text("bgSsn", 9, 170.0, 572.0, 110.0),
        FieldDefinition::signature("bgSignature", 9, 72.0, 140.0, 220.0).required(),
        date("bgDate", 9, 380.0, 140.0).required(),
    ]
}

fn clearinghouse_page() -> Vec<FieldDefinition> {
    vec![
        text("chName", 11, 72.0, 560.0, 220.0),
        text("chCdlNumber", 11, 300.0, 560.0, 150.0),
        text("chCdlState", 11, 460.0, 560.0, 40.0),
        FieldDefinition::signature("chSignature", 11, 72.0, 140.0, 220.0).required(),
        date("chDate", 11, 380.0, 140.0).required(),
    ]
}

fn drug_alcohol_inquiry_page() -> Vec<FieldDefinition> {
    let mut fields = vec![
        text("daPrevEmployer", 12, 72.0, 640.0, 250.0),
        text("daPrevEmployerPhone", 12, 330.0, 640.0, 110.0),
    ];
    fields.extend(yes_no("daTestedPositive", 12, 430.0, 600.0));
    fields.extend([
        FieldDefinition::signature("daSignature", 12, 72.0, 420.0, 220.0).required(),
        date("daDate", 12, 380.0, 420.0).required(),
    ]);
    fields
}

fn safety_history_page() -> Vec<FieldDefinition> {
    vec![
        text("sphPrevEmployer", 13, 72.0, 660.0, 250.0),
        text("sphAddress", 13, 72.0, 632.0, 380.0),
        date("sphEmploymentFrom", 13, 72.0, 604.0),
        date("sphEmploymentTo", 13, 180.0, 604.0),
        FieldDefinition::signature("sphSignature", 13, 72.0, 520.0, 220.0).required(),
        date("sphDate", 13, 380.0, 520.0),
    ]
}

fn violations_page() -> Vec<FieldDefinition> {
    let mut fields = vec![check("violationsNone", 17, 72.0, 620.0)];
    for i in 1..=2u32 {
        let y = 580.0 - f64::from(i - 1) * 28.0;
        fields.extend([
            date(&format!("violation{}Date", i), 17, 72.0, y),
            text(&format!("violation{}Offense", i), 17, 160.0, y, 170.0),
            text(&format!("violation{}Location", i), 17, 340.0, y, 110.0),
            text(&format!("violation{}Vehicle", i), 17, 460.0, y, 90.0),
        ]);
    }
    fields.extend([
        FieldDefinition::signature("violationsSignature", 17, 72.0, 160.0, 220.0).required(),
        date("violationsDate", 17, 380.0, 160.0).required(),
    ]);
    fields
}

fn medical_page() -> Vec<FieldDefinition> {
    vec![
        text("medExaminerName", 18, 72.0, 640.0, 220.0),
        text("medRegistryNumber", 18, 300.0, 640.0, 120.0),
        date("medCertDate", 18, 72.0, 612.0),
        date("medExpiration", 18, 180.0, 612.0),
        check("medRestrictionLenses", 18, 72.0, 580.0),
        check("medRestrictionHearing", 18, 200.0, 580.0),
    ]
}

fn on_duty_page() -> Vec<FieldDefinition> {
    let mut fields: Vec<FieldDefinition> = (1..=7u32)
        .map(|day| {
            text(
                &format!("day{}Hours", day),
                21,
                72.0 + f64::from(day - 1) * 62.0,
                620.0,
                40.0,
            )
        })
        .collect();
    fields.extend([
        text("totalHours", 21, 72.0, 580.0, 60.0),
        date("lastRelievedDate", 21, 200.0, 580.0),
        text("lastRelievedTime", 21, 300.0, 580.0, 60.0),
        FieldDefinition::signature("dutySignature", 21, 72.0, 200.0, 220.0).required(),
        date("dutyDate", 21, 380.0, 200.0),
    ]);
    fields
}

fn other_work_page() -> Vec<FieldDefinition> {
    let mut fields = yes_no("otherWork", 22, 400.0, 640.0).to_vec();
    fields.extend([
        text("otherEmployerName", 22, 72.0, 600.0, 300.0),
        FieldDefinition::signature("otherWorkSignature", 22, 72.0, 200.0, 220.0).required(),
        date("otherWorkDate", 22, 380.0, 200.0),
    ]);
    fields
}

fn eldt_page() -> Vec<FieldDefinition> {
    vec![
        text("eldtProvider", 23, 72.0, 620.0, 260.0),
        date("eldtCompletionDate", 23, 350.0, 620.0),
        text("eldtTprNumber", 23, 72.0, 592.0, 150.0),
    ]
}
