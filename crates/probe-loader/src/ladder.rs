use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Retry attempts are capped: one rung per attempt, three rungs total.
pub const MAX_RETRIES: u32 = 3;

/// Known region-slug rewrites: the showtimes page uses a city's full
/// slug while the seat-layout path wants the booking-site abbreviation.
static REGION_REWRITES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("bengaluru", "bang"),
        ("hyderabad", "hyd"),
        ("mumbai", "mumbai"),
        ("national-capital-region-ncr", "ncr"),
        ("chennai", "chen"),
        ("pune", "pune"),
        ("kolkata", "kolk"),
        ("kochi", "koch"),
        ("chandigarh", "chd"),
        ("ahmedabad", "ahd"),
    ])
});

/// Ordered region hypotheses tried when the speculative load misses the
/// target page: (1) the known-rewrite map, (2) the slug's first three
/// characters, (3) its first four. A rung that does not apply (no map
/// entry) is skipped without consuming a fresh attempt; every rung works
/// from the original slug, never from a previous rewrite.
#[derive(Debug)]
pub struct RetryLadder {
    original: String,
    rung: u32,
}

impl RetryLadder {
    pub fn new(region: &str) -> Self {
        Self {
            original: region.to_lowercase(),
            rung: 0,
        }
    }

    /// Region for the next retry, or `None` once the ladder is exhausted.
    pub fn next_region(&mut self) -> Option<String> {
        while self.rung < MAX_RETRIES {
            self.rung += 1;
            match self.rung {
                1 => {
                    if let Some(code) = REGION_REWRITES.get(self.original.as_str()) {
                        return Some((*code).to_string());
                    }
                    // No map entry: fall through to truncation.
                }
                2 => return Some(truncated(&self.original, 3)),
                _ => return Some(truncated(&self.original, 4)),
            }
        }
        None
    }

    pub fn attempts_used(&self) -> u32 {
        self.rung
    }
}

fn truncated(slug: &str, length: usize) -> String {
    slug.chars().take(length).collect()
}
