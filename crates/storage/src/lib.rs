pub mod assignments;
pub mod deployment;
pub mod error;
pub mod fans;
pub mod history;
pub mod license;
pub mod pool;
pub mod profiles;
pub mod sensors;
pub mod settings;
pub mod systems;
pub mod types;
pub mod visibility;

use std::path::Path;

pub use error::{StorageError, StorageResult};

use assignments::AssignmentsRepo;
use deployment::DeploymentRepo;
use fans::FansRepo;
use history::HistoryRepo;
use license::LicenseRepo;
use profiles::ProfilesRepo;
use sensors::SensorsRepo;
use settings::SettingsRepo;
use systems::SystemsRepo;
use visibility::VisibilityRepo;

/// Handle to the whole storage layer. One pool shared by every repo; each
/// repo is cheap to clone since it only wraps the pool handle.
#[derive(Clone)]
pub struct Storage {
    pub systems: SystemsRepo,
    pub sensors: SensorsRepo,
    pub fans: FansRepo,
    pub profiles: ProfilesRepo,
    pub assignments: AssignmentsRepo,
    pub history: HistoryRepo,
    pub settings: SettingsRepo,
    pub license: LicenseRepo,
    pub deployment: DeploymentRepo,
    pub visibility: VisibilityRepo,
}

impl Storage {
    pub async fn open(path: &Path) -> StorageResult<Self> {
        let pool = pool::open(path).await?;
        Ok(Self::from_pool(pool))
    }

    pub async fn open_in_memory() -> StorageResult<Self> {
        let pool = pool::open_in_memory().await?;
        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: sqlx::SqlitePool) -> Self {
        Self {
            systems: SystemsRepo::new(pool.clone()),
            sensors: SensorsRepo::new(pool.clone()),
            fans: FansRepo::new(pool.clone()),
            profiles: ProfilesRepo::new(pool.clone()),
            assignments: AssignmentsRepo::new(pool.clone()),
            history: HistoryRepo::new(pool.clone()),
            settings: SettingsRepo::new(pool.clone()),
            license: LicenseRepo::new(pool.clone()),
            deployment: DeploymentRepo::new(pool.clone()),
            visibility: VisibilityRepo::new(pool),
        }
    }
}
