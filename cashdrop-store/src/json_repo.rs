use async_trait::async_trait;
use cashdrop_core::{BoxError, OrderRepository};
use cashdrop_shared::{Order, OrderEvent};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

const ORDERS_DIR: &str = "orders";
const EVENT_LOG: &str = "events.jsonl";

/// File-backed repository: one JSON snapshot per order plus an append-only JSON-lines event log
pub struct JsonFileOrderRepository {
    root: PathBuf,
    log_lock: Mutex<()>,
}

impl JsonFileOrderRepository {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, BoxError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ORDERS_DIR)).await?;
        info!("Order store opened at {}", root.display());
        Ok(Self {
            root,
            log_lock: Mutex::new(()),
        })
    }

    fn order_path(&self, id: Uuid) -> PathBuf {
        self.root.join(ORDERS_DIR).join(format!("{}.json", id))
    }

    fn log_path(&self) -> PathBuf {
        self.root.join(EVENT_LOG)
    }
}

#[async_trait]
impl OrderRepository for JsonFileOrderRepository {
    async fn save_order(&self, order: &Order) -> Result<(), BoxError> {
        let path = self.order_path(order.id);
        // Unique per write so concurrent saves of one order never share a temp file
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, serde_json::to_vec_pretty(order)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        match fs::read(self.order_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), BoxError> {
        match fs::remove_file(self.order_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, BoxError> {
        let mut orders = Vec::new();
        let mut entries = fs::read_dir(self.root.join(ORDERS_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<Order>(&bytes) {
                Ok(order) => orders.push(order),
                Err(e) => warn!("Skipping unreadable order file {}: {}", path.display(), e),
            }
        }
        Ok(orders)
    }

    async fn append_event(&self, event: &OrderEvent) -> Result<(), BoxError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.log_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_events(&self) -> Result<Vec<OrderEvent>, BoxError> {
        let contents = match fs::read_to_string(self.log_path()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            events.push(serde_json::from_str(line)?);
        }
        Ok(events)
    }
}
