//! Built-in example dataset.

use dash_ingest::SourceFile;
use dash_model::CategoryKey;

use crate::config::DashConfig;
use crate::dashboard::{Dashboard, IngestMode};

const ACQUISITION: &str = "\
# Example acquisition report
# Last 28 days
Session source,Users,New users,Sessions,Average engagement time
google,1204,980,1650,\"1,42\"
(direct),640,512,820,\"0,58\"
linkedin.com,210,198,260,\"2,10\"
bing,95,80,110,\"1,05\"
";

const BEHAVIOR: &str = "\
Page path,Views,Users,Bounce rate
/,2310,1502,41%
/pricing,820,644,35%
/blog/launch,455,390,62%
/contact,130,121,28%
";

const CONVERSION: &str = "\
Event name,Conversions,Users,Revenue
sign_up,84,80,0
purchase,31,29,\"2480,50\"
generate_lead,46,44,0
";

const LOYALTY: &str = "\
Cohort,Active users,Returning users,Sessions per active user
Week 1,520,210,\"1,8\"
Week 2,488,236,\"2,1\"
Week 3,502,251,\"2,3\"
";

/// Example file for each category.
pub fn example_files() -> [(CategoryKey, SourceFile); 4] {
    [
        (CategoryKey::Acquisition, SourceFile::new("Acquisition overview.csv", ACQUISITION)),
        (CategoryKey::Behavior, SourceFile::new("Pages and screens.csv", BEHAVIOR)),
        (CategoryKey::Conversion, SourceFile::new("Conversions.csv", CONVERSION)),
        (CategoryKey::Loyalty, SourceFile::new("User retention.csv", LOYALTY)),
    ]
}

/// A dashboard with every category filled from [`example_files`].
pub fn example_dashboard(config: DashConfig) -> Dashboard {
    let mut dashboard = Dashboard::new(config);
    for (key, file) in example_files() {
        if let Err(err) = dashboard.ingest(key, std::slice::from_ref(&file), IngestMode::Replace) {
            tracing::warn!(category = %key, error = %err, "could not seed example data");
        }
    }
    tracing::info!("seeded example dataset");
    dashboard
}
