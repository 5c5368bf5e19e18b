use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{Budget, BudgetRequest},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, warn};
use trackmybudget_core::budgets::BudgetInput;
use trackmybudget_core::RepositoryTrait;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/budgets",
    tag = "budgets",
    responses((status = 200, body = [Budget]))
)]
pub async fn list_budgets(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Budget>>> {
    info!("GetBudgets action called.");
    let uow = state.unit_of_work_factory.begin()?;
    let budgets = uow.budgets().get_all().await?;
    if budgets.is_empty() {
        warn!("No budgets found.");
    }
    Ok(Json(budgets.into_iter().map(Budget::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = Uuid, Path, description = "Budget id")),
    responses((status = 200, body = Budget), (status = 404, description = "Not found"))
)]
pub async fn get_budget(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Budget>> {
    info!("GetBudget action called with id: {}", id);
    let uow = state.unit_of_work_factory.begin()?;
    let Some(budget) = uow.budgets().get_by_id(id).await? else {
        warn!("Budget with id {} not found.", id);
        return Err(ApiError::NotFound);
    };
    info!("Budget with id {} retrieved successfully.", id);
    Ok(Json(Budget::from(budget)))
}

#[utoipa::path(
    post,
    path = "/api/budgets",
    tag = "budgets",
    request_body = BudgetRequest,
    responses(
        (status = 201, body = Budget, headers(("location" = String, description = "URL of the new budget"))),
        (status = 400, description = "Invalid budget")
    )
)]
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, [(header::HeaderName, String); 1], Json<Budget>)> {
    info!("CreateBudget action called.");
    let Json(request) = payload?;
    let input = validated(BudgetInput::from(request))?;
    let budget = input.into_budget(Uuid::new_v4());

    let uow = state.unit_of_work_factory.begin()?;
    uow.budgets().add(budget.clone()).await?;
    uow.commit().await?;
    info!("Budget created successfully with id {}.", budget.id);

    let location = format!("/api/budgets/{}", budget.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Budget::from(budget)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = Uuid, Path, description = "Budget id")),
    request_body = BudgetRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Invalid budget"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_budget(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    info!("UpdateBudget action called with id: {}", id);
    let Json(request) = payload?;
    let uow = state.unit_of_work_factory.begin()?;
    let Some(mut budget) = uow.budgets().get_by_id(id).await? else {
        warn!("Budget with id {} not found for update.", id);
        return Err(ApiError::NotFound);
    };

    budget.overwrite_with(validated(BudgetInput::from(request))?);
    uow.budgets().update(budget)?;
    uow.commit().await?;
    info!("Budget with id {} updated successfully.", id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = Uuid, Path, description = "Budget id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_budget(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    info!("DeleteBudget action called with id: {}", id);
    let uow = state.unit_of_work_factory.begin()?;
    let Some(budget) = uow.budgets().get_by_id(id).await? else {
        warn!("Budget with id {} not found for deletion.", id);
        return Err(ApiError::NotFound);
    };

    uow.budgets().remove(budget)?;
    uow.commit().await?;
    info!("Budget with id {} deleted successfully.", id);
    Ok(StatusCode::NO_CONTENT)
}

fn validated(input: BudgetInput) -> ApiResult<BudgetInput> {
    if let Err(e) = input.validate() {
        warn!("Rejected budget payload: {}", e);
        return Err(e.into());
    }
    Ok(input)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/budgets", get(list_budgets).post(create_budget))
        .route(
            "/api/budgets/{id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::io;
    use std::sync::Mutex;
    use trackmybudget_core::budgets::{Budget as CoreBudget, BudgetRepositoryTrait};
    use trackmybudget_core::errors::{DatabaseError, Error, Result};
    use trackmybudget_core::{UnitOfWorkFactoryTrait, UnitOfWorkTrait};

    // --- In-memory unit of work ---

    type Store = Arc<Mutex<Vec<CoreBudget>>>;

    struct MemoryRepository {
        working: Mutex<Vec<CoreBudget>>,
        changes: Mutex<usize>,
        fail_reads: bool,
    }

    impl MemoryRepository {
        fn record_change(&self) {
            *self.changes.lock().unwrap() += 1;
        }
    }

    #[async_trait]
    impl RepositoryTrait<CoreBudget> for MemoryRepository {
        async fn get_all(&self) -> Result<Vec<CoreBudget>> {
            if self.fail_reads {
                return Err(DatabaseError::QueryFailed("disk I/O error".into()).into());
            }
            Ok(self.working.lock().unwrap().clone())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<CoreBudget>> {
            Ok(self
                .working
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == id)
                .cloned())
        }

        async fn add(&self, budget: CoreBudget) -> Result<()> {
            self.working.lock().unwrap().push(budget);
            self.record_change();
            Ok(())
        }

        fn update(&self, budget: CoreBudget) -> Result<()> {
            let mut working = self.working.lock().unwrap();
            if let Some(slot) = working.iter_mut().find(|b| b.id == budget.id) {
                *slot = budget;
            }
            self.record_change();
            Ok(())
        }

        fn remove(&self, budget: CoreBudget) -> Result<()> {
            self.working.lock().unwrap().retain(|b| b.id != budget.id);
            self.record_change();
            Ok(())
        }
    }

    impl BudgetRepositoryTrait for MemoryRepository {}

    struct MemoryUnitOfWork {
        store: Store,
        budgets: MemoryRepository,
    }

    #[async_trait]
    impl UnitOfWorkTrait for MemoryUnitOfWork {
        fn budgets(&self) -> &dyn BudgetRepositoryTrait {
            &self.budgets
        }

        async fn commit(&self) -> Result<usize> {
            *self.store.lock().unwrap() = self.budgets.working.lock().unwrap().clone();
            Ok(std::mem::take(&mut *self.budgets.changes.lock().unwrap()))
        }
    }

    struct MemoryFactory {
        store: Store,
        fail_reads: bool,
    }

    impl UnitOfWorkFactoryTrait for MemoryFactory {
        fn begin(&self) -> Result<Box<dyn UnitOfWorkTrait>> {
            Ok(Box::new(MemoryUnitOfWork {
                store: self.store.clone(),
                budgets: MemoryRepository {
                    working: Mutex::new(self.store.lock().unwrap().clone()),
                    changes: Mutex::new(0),
                    fail_reads: self.fail_reads,
                },
            }))
        }
    }

    fn state_with(budgets: Vec<CoreBudget>) -> (Arc<AppState>, Store) {
        let store: Store = Arc::new(Mutex::new(budgets));
        let state = Arc::new(AppState {
            unit_of_work_factory: Arc::new(MemoryFactory {
                store: store.clone(),
                fail_reads: false,
            }),
        });
        (state, store)
    }

    fn sample_budget(category: &str) -> CoreBudget {
        CoreBudget {
            id: Uuid::new_v4(),
            category: category.to_string(),
            amount: dec!(1000),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
        }
    }

    fn request(category: &str, amount: rust_decimal::Decimal) -> BudgetRequest {
        BudgetRequest {
            category: category.to_string(),
            amount,
            start_date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
        }
    }

    // --- Log capture ---

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        /// Returns the captured line containing `needle`.
        fn line_with(&self, needle: &str) -> Option<String> {
            let raw = self.0.lock().unwrap().clone();
            String::from_utf8_lossy(&raw)
                .lines()
                .find(|line| line.contains(needle))
                .map(str::to_string)
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn assert_logged(logs: &CapturedLogs, level: &str, needle: &str) {
        let line = logs
            .line_with(needle)
            .unwrap_or_else(|| panic!("no log line containing {:?}", needle));
        assert!(line.contains(level), "expected {} in {:?}", level, line);
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_list_returns_every_budget() {
        let (logs, _guard) = capture_logs();
        let (state, _) = state_with(vec![sample_budget("Food"), sample_budget("Rent")]);

        let Json(budgets) = list_budgets(State(state)).await.unwrap();

        assert_eq!(budgets.len(), 2);
        assert_logged(&logs, "INFO", "GetBudgets action called.");
        assert!(logs.line_with("No budgets found.").is_none());
    }

    #[tokio::test]
    async fn test_list_empty_warns() {
        let (logs, _guard) = capture_logs();
        let (state, _) = state_with(Vec::new());

        let Json(budgets) = list_budgets(State(state)).await.unwrap();

        assert!(budgets.is_empty());
        assert_logged(&logs, "WARN", "No budgets found.");
    }

    #[tokio::test]
    async fn test_get_existing_budget() {
        let (logs, _guard) = capture_logs();
        let budget = sample_budget("Travel");
        let (state, _) = state_with(vec![budget.clone()]);

        let Json(found) = get_budget(Path(budget.id), State(state)).await.unwrap();

        assert_eq!(found, Budget::from(budget.clone()));
        assert_logged(
            &logs,
            "INFO",
            &format!("Budget with id {} retrieved successfully.", budget.id),
        );
    }

    #[tokio::test]
    async fn test_get_unknown_budget_is_not_found() {
        let (logs, _guard) = capture_logs();
        let (state, _) = state_with(vec![sample_budget("Travel")]);
        let id = Uuid::new_v4();

        let result = get_budget(Path(id), State(state)).await;

        assert!(matches!(result, Err(ApiError::NotFound)));
        assert_logged(&logs, "WARN", &format!("Budget with id {} not found.", id));
    }

    #[tokio::test]
    async fn test_create_assigns_new_id_and_commits() {
        let (logs, _guard) = capture_logs();
        let (state, store) = state_with(Vec::new());
        let body = request("Test", dec!(100));

        let (status, [(name, location)], Json(created)) =
            create_budget(State(state), Ok(Json(body))).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(name, header::LOCATION);
        assert_eq!(location, format!("/api/budgets/{}", created.id));
        assert_eq!(store.lock().unwrap()[0].id, created.id);
        assert_eq!(created.category, "Test");
        assert_eq!(store.lock().unwrap().len(), 1);
        assert_logged(
            &logs,
            "INFO",
            &format!("Budget created successfully with id {}.", created.id),
        );
    }

    #[tokio::test]
    async fn test_create_rejects_blank_category() {
        let (logs, _guard) = capture_logs();
        let (state, store) = state_with(Vec::new());

        let result = create_budget(State(state), Ok(Json(request("  ", dec!(5))))).await;

        assert!(matches!(result, Err(ApiError::Core(Error::Validation(_)))));
        assert!(store.lock().unwrap().is_empty());
        assert_logged(&logs, "WARN", "Rejected budget payload");
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let (logs, _guard) = capture_logs();
        let budget = sample_budget("Groceries");
        let (state, store) = state_with(vec![budget.clone()]);
        let body = request("Updated Category", dec!(500));

        let status = update_budget(Path(budget.id), State(state), Ok(Json(body.clone())))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = store.lock().unwrap()[0].clone();
        assert_eq!(stored.id, budget.id);
        assert_eq!(stored.category, "Updated Category");
        assert_eq!(stored.amount, dec!(500));
        assert_eq!(stored.start_date, body.start_date);
        assert_eq!(stored.end_date, body.end_date);
        assert_logged(
            &logs,
            "INFO",
            &format!("Budget with id {} updated successfully.", budget.id),
        );
    }

    #[tokio::test]
    async fn test_update_unknown_budget_is_not_found() {
        let (logs, _guard) = capture_logs();
        let (state, store) = state_with(Vec::new());
        let id = Uuid::new_v4();

        let result = update_budget(Path(id), State(state), Ok(Json(request("X", dec!(1))))).await;

        assert!(matches!(result, Err(ApiError::NotFound)));
        assert!(store.lock().unwrap().is_empty());
        assert_logged(
            &logs,
            "WARN",
            &format!("Budget with id {} not found for update.", id),
        );
    }

    #[tokio::test]
    async fn test_delete_removes_budget() {
        let (logs, _guard) = capture_logs();
        let budget = sample_budget("Gym");
        let (state, store) = state_with(vec![budget.clone()]);

        let status = delete_budget(Path(budget.id), State(state)).await.unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.lock().unwrap().is_empty());
        assert_logged(
            &logs,
            "INFO",
            &format!("Budget with id {} deleted successfully.", budget.id),
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_budget_is_not_found() {
        let (logs, _guard) = capture_logs();
        let (state, _) = state_with(Vec::new());
        let id = Uuid::new_v4();

        let result = delete_budget(Path(id), State(state)).await;

        assert!(matches!(result, Err(ApiError::NotFound)));
        assert_logged(
            &logs,
            "WARN",
            &format!("Budget with id {} not found for deletion.", id),
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let state = Arc::new(AppState {
            unit_of_work_factory: Arc::new(MemoryFactory {
                store: Arc::new(Mutex::new(Vec::new())),
                fail_reads: true,
            }),
        });

        let result = list_budgets(State(state)).await;

        assert!(matches!(
            result,
            Err(ApiError::Core(Error::Database(DatabaseError::QueryFailed(_))))
        ));
    }
}
