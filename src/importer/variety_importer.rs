// ==========================================
// 农作物种植监测系统 - 品种目录导入
// ==========================================
// 输入: CSV（表头 crop_name,name,maturity_days）
// 规则: 按 (crop_name, name) 存在则更新成熟天数，否则新增
//       maturity_days 为空 → None；非数字 → 跳过该行并告警
// ==========================================

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::variety::Variety;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::variety_repo::{UpsertOutcome, VarietyRepository};

const COL_CROP_NAME: &str = "crop_name";
const COL_NAME: &str = "name";
const COL_MATURITY_DAYS: &str = "maturity_days";

/// 导入汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarietyImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

// ==========================================
// VarietyImporter - 品种目录导入器
// ==========================================
pub struct VarietyImporter {
    variety_repo: Arc<VarietyRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl VarietyImporter {
    pub fn new(variety_repo: Arc<VarietyRepository>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            variety_repo,
            action_log_repo,
        }
    }

    /// 从 CSV 导入品种目录
    #[instrument(skip(self, path))]
    pub fn import_csv(&self, path: impl AsRef<Path>, actor: &str) -> ImportResult<VarietyImportSummary> {
        let path = path.as_ref();
        let (varieties, skipped) = parse_varieties(path)?;

        let outcomes = self.variety_repo.upsert_batch(&varieties)?;
        let mut summary = VarietyImportSummary {
            skipped,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
            }
        }

        let log = ActionLog::now(
            ActionType::ImportVarieties,
            actor,
            None,
            Some(json!(summary)),
            Some(path.display().to_string()),
        );
        self.action_log_repo.insert(&log)?;

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "品种目录导入完成"
        );
        Ok(summary)
    }
}

/// 解析 CSV 为品种列表
///
/// # 返回
/// - (有效品种, 跳过行数)
fn parse_varieties(path: &Path) -> ImportResult<(Vec<Variety>, usize)> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.to_path_buf()));
    }
    if let Some(ext) = path.extension() {
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
        }
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.trim().to_lowercase(), idx))
        .collect();
    for column in [COL_CROP_NAME, COL_NAME] {
        if !headers.contains_key(column) {
            return Err(ImportError::MissingColumn(column));
        }
    }
    let field = |record: &csv::StringRecord, column: &str| -> String {
        headers
            .get(column)
            .and_then(|&idx| record.get(idx))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut varieties = Vec::new();
    let mut skipped = 0;
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        // 表头占第 1 行
        let row = row_idx + 2;

        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let crop_name = field(&record, COL_CROP_NAME);
        let name = field(&record, COL_NAME);
        if crop_name.is_empty() || name.is_empty() {
            warn!(row = row, "作物或品种名称为空，跳过");
            skipped += 1;
            continue;
        }

        let raw_days = field(&record, COL_MATURITY_DAYS);
        let maturity_days = if raw_days.is_empty() {
            None
        } else {
            match raw_days.parse::<i32>() {
                Ok(days) if days >= 0 => Some(days),
                _ => {
                    warn!(row = row, value = %raw_days, "成熟天数不是有效数字，跳过");
                    skipped += 1;
                    continue;
                }
            }
        };

        varieties.push(Variety {
            variety_id: uuid::Uuid::new_v4().to_string(),
            crop_name,
            name,
            maturity_days,
        });
    }

    Ok((varieties, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::Builder;

    fn setup() -> (VarietyImporter, Arc<VarietyRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let variety_repo = Arc::new(VarietyRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));
        (VarietyImporter::new(variety_repo.clone(), action_log_repo), variety_repo)
    }

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_import_inserts_updates_and_skips() {
        let (importer, repo) = setup();

        let first = csv_file(&[
            "crop_name,name,maturity_days",
            "Yellow,Pioneer 30T80,110",
            "White,Lagkitan,",
            "White,Tiniguib,abc",
            ",,",
        ]);
        let summary = importer.import_csv(first.path(), "A001").unwrap();
        assert_eq!(
            summary,
            VarietyImportSummary {
                inserted: 2,
                updated: 0,
                skipped: 1
            }
        );
        assert_eq!(repo.find_by_name("White", "Lagkitan").unwrap().unwrap().maturity_days, None);

        let second = csv_file(&["crop_name,name,maturity_days", "Yellow,Pioneer 30T80,115"]);
        let summary = importer.import_csv(second.path(), "A001").unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.inserted, 0);
        assert_eq!(
            repo.find_by_name("Yellow", "Pioneer 30T80").unwrap().unwrap().maturity_days,
            Some(115)
        );
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let (importer, _) = setup();
        let file = csv_file(&["crop,maturity_days", "Yellow,110"]);
        assert!(matches!(
            importer.import_csv(file.path(), "A001"),
            Err(ImportError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_file_not_found() {
        let (importer, _) = setup();
        assert!(matches!(
            importer.import_csv("non_existent.csv", "A001"),
            Err(ImportError::FileNotFound(_))
        ));
    }
}
