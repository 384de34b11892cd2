use std::error::Error;
use std::future::Future;
use std::sync::LazyLock;

use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use db::DbConfig;

// The mem engine parks its router task on whichever runtime opens the
// connection, and the connection itself is process-global. All database
// tests therefore share this one runtime; a per-test runtime would take
// the router down with it when the first test finished.
static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("test runtime")
});

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Run one test body on the shared runtime with exclusive access to a
/// freshly wiped database.
pub fn run<F>(test: F) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = Result<(), Box<dyn Error>>>,
{
    RUNTIME.block_on(async {
        let _guard = TEST_LOCK.lock().await;
        db::init(DbConfig::memory()).await?;
        db::get_db()?
            .query("DELETE registration; DELETE contact_message; DELETE admin_user; DELETE setting; DELETE counter;")
            .await?;
        test.await
    })
}
