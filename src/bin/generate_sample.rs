use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};

use govcon_dashboard::data::model::Field;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

const OPPORTUNITY_TYPES: &[&str] = &[
    "Sources Sought",
    "Presolicitation",
    "Solicitation",
    "Combined Synopsis/Solicitation",
    "Award Notice",
    "Special Notice",
    "Justification",
];

const NAICS: &[&str] = &[
    "Commercial and Institutional Building Construction",
    "Surgical and Medical Instrument Manufacturing",
    "Hazardous Waste Treatment and Disposal",
    "Couriers and Express Delivery Services",
    "Testing Laboratories",
    "Medical Laboratories",
    "Diagnostic Imaging Centers",
    "Engineering Services",
    "Janitorial Services",
];

const SET_ASIDES: &[&str] = &[
    "Total Small Business Set-Aside (FAR 19.5)",
    "8(a) Set-Aside (FAR 19.8)",
    "Service-Disabled Veteran-Owned Small Business (SDVOSB) Set-Aside (FAR 19.14)",
    "Historically Underutilized Business (HUBZone) Set-Aside (FAR 19.13)",
    "",
];

const AGENCIES: &[&str] = &[
    "DEPT OF DEFENSE",
    "VETERANS AFFAIRS, DEPARTMENT OF",
    "HEALTH AND HUMAN SERVICES, DEPARTMENT OF",
    "GENERAL SERVICES ADMINISTRATION",
];

const SUBJECTS: &[&str] = &[
    "Laboratory testing services",
    "MRI maintenance",
    "Medical waste pickup",
    "Clinic renovation",
    "Courier services - specimen transport",
    "Surgical instruments, reusable",
    "Café and break room upgrades",
];

/// Render a date the way the different extract vintages do.
fn format_response_date(date: NaiveDate, style: u64) -> String {
    match style {
        0 => date.format("%Y-%m-%dT17:00:00-05:00").to_string(),
        1 => date.format("%Y-%m-%d %H:%M:%S").to_string(),
        2 => date.format("%m/%d/%Y").to_string(),
        3 => date.format("%Y-%m-%d").to_string(),
        _ => String::new(),
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_opportunities.csv".to_string());
    let mut rng = SimpleRng::new(42);
    let today = Local::now().date_naive();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = Field::ALL.iter().map(|f| f.header()).collect();
    header.insert(2, "Department/Ind.Agency");
    writer.write_record(&header)?;

    let n_rows: u32 = 200;
    for i in 0..n_rows {
        // Response dates spread from 30 days ago to 90 days ahead.
        let offset = rng.below(120) as i64 - 30;
        let shifted = if offset < 0 {
            today.checked_sub_days(Days::new(offset.unsigned_abs()))
        } else {
            today.checked_add_days(Days::new(offset as u64))
        };
        let date = shifted.context("date out of range")?;
        let date_text = match rng.below(20) {
            0 => "TBD".to_string(),
            r => format_response_date(date, r % 5),
        };

        let notice_id = format!("{:032x}", u128::from(rng.next_u64()) * 7919 + u128::from(i));
        let title = format!("{} ({})", rng.pick(SUBJECTS), i + 1);
        let status = if rng.below(10) == 0 { "No" } else { "Yes" };

        writer.write_record([
            notice_id.as_str(),
            title.as_str(),
            rng.pick(AGENCIES),
            date_text.as_str(),
            rng.pick(OPPORTUNITY_TYPES),
            status,
            rng.pick(NAICS),
            rng.pick(SET_ASIDES),
        ])?;
    }

    let text = String::from_utf8(writer.into_inner().map_err(|e| e.into_error())?)?;
    // SAM.gov extracts are Latin-1; every character used here fits.
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    std::fs::write(&output_path, bytes).with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_rows} opportunities (latin1) to {output_path}");
    Ok(())
}
