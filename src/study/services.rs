use std::collections::{BTreeMap, HashMap};

use time::{macros::format_description, Date, Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{ChartQuery, ChartResponse, CreateModuleRequest, CreateSessionRequest},
    error::StudyError,
    repo::StudyStore,
    repo_types::{Module, NewSession, StudySession},
};
use crate::{
    dashboard::{
        chart::{data_key, is_css_color},
        ChartConfig, ChartDataPoint, ChartModule, ChartSeries, DateRange,
    },
    db::StoreError,
};

const DEFAULT_RANGE_DAYS: i64 = 7;
const MAX_RANGE_DAYS: i64 = 366;
const MAX_NAME_LEN: usize = 64;
const PALETTE_SIZE: usize = 5;
const MAX_SESSION_SECS: i64 = 24 * 60 * 60;
/// Chart rows carry the day under this key, next to the module keys.
const RESERVED_KEY: &str = "day";

pub async fn create_module(
    store: &dyn StudyStore,
    user_id: Uuid,
    body: CreateModuleRequest,
) -> Result<Module, StudyError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(StudyError::BadRequest(format!(
            "module name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    let key = data_key(name);
    if key == RESERVED_KEY {
        return Err(StudyError::BadRequest(format!(
            "module name `{name}` is reserved"
        )));
    }
    let color = body.color.as_deref().map(str::trim).filter(|c| !c.is_empty());
    if let Some(c) = color {
        if !is_css_color(c) {
            return Err(StudyError::BadRequest(
                "color must be a hex colour or a var(--name) reference".into(),
            ));
        }
    }

    // Names that differ only in whitespace style share a chart key.
    let existing = store.list_modules(user_id).await?;
    if existing.iter().any(|m| data_key(&m.name) == key) {
        warn!(%user_id, %key, "module chart key already used");
        return Err(StudyError::Conflict("Module already exists".into()));
    }

    match store.create_module(user_id, name, color).await {
        Ok(m) => {
            info!(%user_id, module_id = %m.id, "module created");
            Ok(m)
        }
        Err(StoreError::Duplicate) => {
            warn!(%user_id, "module name already used");
            Err(StudyError::Conflict("Module already exists".into()))
        }
        Err(StoreError::Other(e)) => Err(StudyError::Internal(e)),
    }
}

pub async fn create_session(
    store: &dyn StudyStore,
    user_id: Uuid,
    body: CreateSessionRequest,
) -> Result<StudySession, StudyError> {
    if body.duration_secs <= 0 || body.duration_secs > MAX_SESSION_SECS {
        return Err(StudyError::BadRequest(format!(
            "duration_secs must be in 1..={MAX_SESSION_SECS}"
        )));
    }
    if store.find_module(user_id, body.module_id).await?.is_none() {
        return Err(StudyError::NotFound);
    }

    let session = store
        .insert_session(
            user_id,
            NewSession {
                module_id: body.module_id,
                started_at: body.started_at,
                duration_secs: body.duration_secs,
            },
        )
        .await?;
    info!(%user_id, session_id = %session.id, "study session recorded");
    Ok(session)
}

pub async fn chart(
    store: &dyn StudyStore,
    user_id: Uuid,
    query: &ChartQuery,
) -> Result<(DateRange, ChartResponse), StudyError> {
    let today = OffsetDateTime::now_utc().date();
    let (from, to) = resolve_range(query.from.as_deref(), query.to.as_deref(), today)?;

    let until = to.next_day().map(day_start).ok_or_else(out_of_range)?;

    let modules = store.list_modules(user_id).await?;
    let sessions = store
        .sessions_between(user_id, day_start(from), until)
        .await?;

    let range = DateRange {
        initial_date: from.to_string(),
        final_date: to.to_string(),
    };
    Ok((range, build_chart(&modules, &sessions, from, to)))
}

/// Inclusive date range from the query, defaulting to the week ending `today`.
pub fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    today: Date,
) -> Result<(Date, Date), StudyError> {
    let to = match to {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let from = match from {
        Some(s) => parse_date(s)?,
        None => to
            .checked_sub(Duration::days(DEFAULT_RANGE_DAYS - 1))
            .ok_or_else(out_of_range)?,
    };
    if from > to {
        return Err(StudyError::BadRequest("from must not be after to".into()));
    }
    if (to - from).whole_days() + 1 > MAX_RANGE_DAYS {
        return Err(StudyError::BadRequest(format!(
            "range must not exceed {MAX_RANGE_DAYS} days"
        )));
    }
    Ok((from, to))
}

/// Per-day, per-module totals for every day in `from..=to`.
pub fn build_chart(
    modules: &[Module],
    sessions: &[StudySession],
    from: Date,
    to: Date,
) -> ChartResponse {
    let keys: HashMap<Uuid, String> = modules
        .iter()
        .map(|m| (m.id, data_key(&m.name)))
        .collect();

    let mut totals: BTreeMap<Date, BTreeMap<String, i64>> = BTreeMap::new();
    for s in sessions {
        let day = s.started_at.to_offset(time::UtcOffset::UTC).date();
        let Some(key) = keys.get(&s.module_id) else {
            continue;
        };
        let total = totals
            .entry(day)
            .or_default()
            .entry(key.clone())
            .or_insert(0);
        *total = total.saturating_add(s.duration_secs);
    }

    let mut chart_data = Vec::new();
    let mut day = Some(from);
    while let Some(d) = day.filter(|d| *d <= to) {
        chart_data.push(ChartDataPoint {
            day: d.to_string(),
            values: totals.remove(&d).unwrap_or_default(),
        });
        day = d.next_day();
    }

    ChartResponse {
        chart_data,
        chart_config: chart_config(modules),
        modules: modules
            .iter()
            .map(|m| ChartModule {
                name: m.name.clone(),
            })
            .collect(),
    }
}

fn chart_config(modules: &[Module]) -> ChartConfig {
    modules
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let color = m
                .color
                .clone()
                .unwrap_or_else(|| format!("var(--chart-{})", i % PALETTE_SIZE + 1));
            (
                data_key(&m.name),
                ChartSeries {
                    label: m.name.clone(),
                    color,
                },
            )
        })
        .collect()
}

fn parse_date(s: &str) -> Result<Date, StudyError> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| StudyError::BadRequest(format!("invalid date: {s}")))
}

fn out_of_range() -> StudyError {
    StudyError::BadRequest("date out of range".into())
}

fn day_start(d: Date) -> OffsetDateTime {
    d.midnight().assume_utc()
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::study::repo::fakes::InMemoryStudyStore;

    fn module(name: &str, color: Option<&str>) -> Module {
        Module {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.into(),
            color: color.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn session(module: &Module, started_at: OffsetDateTime, secs: i64) -> StudySession {
        StudySession {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            module_id: module.id,
            started_at,
            duration_secs: secs,
        }
    }

    #[test]
    fn range_defaults_to_last_week() {
        let (from, to) = resolve_range(None, None, date!(2025 - 03 - 09)).unwrap();
        assert_eq!(from, date!(2025 - 03 - 03));
        assert_eq!(to, date!(2025 - 03 - 09));
    }

    #[test]
    fn range_rejects_bad_input() {
        let today = date!(2025 - 03 - 09);
        assert!(resolve_range(Some("2025-03-10"), Some("2025-03-01"), today).is_err());
        assert!(resolve_range(Some("03/01/2025"), None, today).is_err());
        assert!(resolve_range(Some("2023-01-01"), Some("2025-01-01"), today).is_err());
        assert!(resolve_range(Some("2025-03-01"), Some("2025-03-01"), today).is_ok());
    }

    #[tokio::test]
    async fn range_at_calendar_edge_is_bad_request() {
        let store = InMemoryStudyStore::default();
        let user = Uuid::new_v4();
        let last = ChartQuery {
            from: Some("9999-12-31".into()),
            to: Some("9999-12-31".into()),
        };
        assert!(matches!(
            chart(&store, user, &last).await.unwrap_err(),
            StudyError::BadRequest(_)
        ));

        let earliest = Date::MIN;
        assert!(matches!(
            resolve_range(None, None, earliest).unwrap_err(),
            StudyError::BadRequest(_)
        ));
    }

    #[test]
    fn huge_durations_saturate_per_day() {
        let m = module("Rust", None);
        let sessions = vec![
            session(&m, datetime!(2025-03-03 08:00 UTC), i64::MAX),
            session(&m, datetime!(2025-03-03 09:00 UTC), i64::MAX),
        ];
        let chart = build_chart(&[m], &sessions, date!(2025 - 03 - 03), date!(2025 - 03 - 03));
        assert_eq!(chart.chart_data[0].values["Rust"], i64::MAX);
    }

    #[test]
    fn chart_sums_sessions_per_day_and_module() {
        let algebra = module("Linear Algebra", Some("#2563eb"));
        let physics = module("Physics", None);
        let sessions = vec![
            session(&algebra, datetime!(2025-03-03 08:00 UTC), 1800),
            session(&algebra, datetime!(2025-03-03 20:00 UTC), 1200),
            session(&physics, datetime!(2025-03-03 10:00 UTC), 600),
            session(&physics, datetime!(2025-03-05 23:30 UTC), 3600),
        ];

        let chart = build_chart(
            &[algebra, physics],
            &sessions,
            date!(2025 - 03 - 03),
            date!(2025 - 03 - 05),
        );

        assert_eq!(chart.chart_data.len(), 3);
        let mon = &chart.chart_data[0];
        assert_eq!(mon.day, "2025-03-03");
        assert_eq!(mon.values["Linear-Algebra"], 3000);
        assert_eq!(mon.values["Physics"], 600);
        assert!(chart.chart_data[1].values.is_empty());
        assert_eq!(chart.chart_data[2].values["Physics"], 3600);

        assert_eq!(chart.chart_config["Linear-Algebra"].color, "#2563eb");
        assert_eq!(chart.chart_config["Physics"].color, "var(--chart-2)");
        assert_eq!(chart.modules[0].name, "Linear Algebra");
    }

    #[test]
    fn sessions_of_unknown_modules_are_skipped() {
        let known = module("Known", None);
        let stray = module("Stray", None);
        let sessions = vec![session(&stray, datetime!(2025-03-03 08:00 UTC), 100)];
        let chart = build_chart(&[known], &sessions, date!(2025 - 03 - 03), date!(2025 - 03 - 03));
        assert!(chart.chart_data[0].values.is_empty());
    }

    #[tokio::test]
    async fn module_names_are_unique_per_user() {
        let store = InMemoryStudyStore::default();
        let user = Uuid::new_v4();
        let req = || CreateModuleRequest {
            name: " Physics ".into(),
            color: None,
        };

        let m = create_module(&store, user, req()).await.unwrap();
        assert_eq!(m.name, "Physics");
        let err = create_module(&store, user, req()).await.unwrap_err();
        assert!(matches!(err, StudyError::Conflict(_)));
        assert!(create_module(&store, Uuid::new_v4(), req()).await.is_ok());
    }

    #[tokio::test]
    async fn names_sharing_a_chart_key_conflict() {
        let store = InMemoryStudyStore::default();
        let user = Uuid::new_v4();
        let req = |name: &str| CreateModuleRequest {
            name: name.into(),
            color: None,
        };

        create_module(&store, user, req("Deep Work")).await.unwrap();
        for name in ["Deep-Work", "Deep  Work", "Deep\tWork"] {
            let err = create_module(&store, user, req(name)).await.unwrap_err();
            assert!(matches!(err, StudyError::Conflict(_)), "{name}");
        }
        assert_eq!(store.list_modules(user).await.unwrap().len(), 1);
        assert!(create_module(&store, Uuid::new_v4(), req("Deep-Work")).await.is_ok());
    }

    #[tokio::test]
    async fn day_is_a_reserved_module_name() {
        let store = InMemoryStudyStore::default();
        let err = create_module(
            &store,
            Uuid::new_v4(),
            CreateModuleRequest {
                name: " day ".into(),
                color: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StudyError::BadRequest(_)));
    }

    #[tokio::test]
    async fn module_color_must_be_hex_or_var() {
        let store = InMemoryStudyStore::default();
        let user = Uuid::new_v4();
        let req = |name: &str, color: &str| CreateModuleRequest {
            name: name.into(),
            color: Some(color.into()),
        };

        let err = create_module(&store, user, req("Chem", "red; background: url(x)"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::BadRequest(_)));

        let m = create_module(&store, user, req("Chem", " #2563eb "))
            .await
            .unwrap();
        assert_eq!(m.color.as_deref(), Some("#2563eb"));
        assert!(create_module(&store, user, req("Bio", "var(--chart-3)")).await.is_ok());
    }

    #[tokio::test]
    async fn empty_module_name_is_rejected() {
        let store = InMemoryStudyStore::default();
        let err = create_module(
            &store,
            Uuid::new_v4(),
            CreateModuleRequest {
                name: "   ".into(),
                color: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StudyError::BadRequest(_)));
    }

    #[tokio::test]
    async fn sessions_need_own_module_and_bounded_duration() {
        let store = InMemoryStudyStore::default();
        let owner = Uuid::new_v4();
        let m = create_module(
            &store,
            owner,
            CreateModuleRequest {
                name: "Rust".into(),
                color: None,
            },
        )
        .await
        .unwrap();
        let req = |secs| CreateSessionRequest {
            module_id: m.id,
            started_at: datetime!(2025-03-03 08:00 UTC),
            duration_secs: secs,
        };

        assert!(create_session(&store, owner, req(1500)).await.is_ok());
        assert!(create_session(&store, owner, req(24 * 60 * 60)).await.is_ok());
        for secs in [0, 24 * 60 * 60 + 1, i64::MAX] {
            assert!(matches!(
                create_session(&store, owner, req(secs)).await.unwrap_err(),
                StudyError::BadRequest(_)
            ));
        }
        assert_eq!(store.sessions.lock().unwrap().len(), 2);
        assert!(matches!(
            create_session(&store, Uuid::new_v4(), req(60)).await.unwrap_err(),
            StudyError::NotFound
        ));
    }

    #[tokio::test]
    async fn chart_reads_requested_range_from_store() {
        let store = InMemoryStudyStore::default();
        let user = Uuid::new_v4();
        let m = create_module(
            &store,
            user,
            CreateModuleRequest {
                name: "Deep Work".into(),
                color: None,
            },
        )
        .await
        .unwrap();
        for (at, secs) in [
            (datetime!(2025-03-02 23:59 UTC), 999),
            (datetime!(2025-03-03 00:00 UTC), 60),
            (datetime!(2025-03-04 12:00 UTC), 120),
            (datetime!(2025-03-05 00:00 UTC), 999),
        ] {
            create_session(
                &store,
                user,
                CreateSessionRequest {
                    module_id: m.id,
                    started_at: at,
                    duration_secs: secs,
                },
            )
            .await
            .unwrap();
        }

        let query = ChartQuery {
            from: Some("2025-03-03".into()),
            to: Some("2025-03-04".into()),
        };
        let (range, chart) = chart(&store, user, &query).await.unwrap();
        assert_eq!(range.initial_date, "2025-03-03");
        assert_eq!(range.final_date, "2025-03-04");
        let totals: Vec<i64> = chart
            .chart_data
            .iter()
            .map(|p| p.values.get("Deep-Work").copied().unwrap_or(0))
            .collect();
        assert_eq!(totals, [60, 120]);
    }
}
