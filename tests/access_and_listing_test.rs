// ==========================================
// 权限与列表查询测试
// ==========================================
// 职责: 能力检查、本人数据范围、游标分页、分页配置
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod access_and_listing_test {
    use farm_monitor::api::ApiError;
    use farm_monitor::config::config_keys;
    use farm_monitor::domain::{
        Actor, EventQuery, NewHarvestReport, NewInspection, PlantingFilter, PlantingStatus,
    };

    use crate::test_helpers::{date, plant, setup_app};

    fn inspection(planting_id: &str, day: u32) -> NewInspection {
        NewInspection {
            planting_id: planting_id.to_string(),
            inspection_date: date(2025, 5, day),
            damaged_area_ha: 0.1,
            remarks: format!("visit {}", day),
            growth_stage: None,
        }
    }

    // ==========================================
    // 测试1: 能力检查
    // ==========================================
    #[tokio::test]
    async fn test_capability_checks() {
        let (_tmp, state, _) = setup_app();
        let tech = Actor::technician("T001");
        let admin = Actor::admin("A001");
        let coordinator = Actor::coordinator("C001");
        let planting = plant(&state, &tech, 2.0);

        // 管理员不可新建种植、不可登记巡查
        assert!(matches!(
            state
                .planting_api
                .create_planting(&admin, crate::test_helpers::new_planting(1.0)),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            state.inspection_api.record(&admin, inspection(&planting.planting_id, 2)),
            Err(ApiError::PermissionDenied(_))
        ));

        // 协调员只读
        assert!(state.planting_api.get_planting(&coordinator, &planting.planting_id).is_ok());
        assert!(matches!(
            state.harvest_api.record(
                &coordinator,
                NewHarvestReport {
                    planting_id: planting.planting_id.clone(),
                    harvest_date: date(2025, 7, 25),
                    area_harvested_ha: 1.0,
                    total_yield: 3.0,
                    profit: None,
                    damage_quantity: None,
                }
            ),
            Err(ApiError::PermissionDenied(_))
        ));

        // 技术员不可执行到期转换
        assert!(matches!(
            state.sweep_api.run(&tech, date(2025, 8, 1)).await,
            Err(ApiError::PermissionDenied(_))
        ));
    }

    // ==========================================
    // 测试2: 本人数据范围
    // ==========================================
    #[tokio::test]
    async fn test_assigned_scope_only_sees_own_records() {
        let (_tmp, state, _) = setup_app();
        let t1 = Actor::technician("T001");
        let t2 = Actor::technician("T002");
        let admin = Actor::admin("A001");

        let mine = plant(&state, &t1, 2.0);
        let theirs = plant(&state, &t2, 3.0);
        plant(&state, &t2, 1.0);

        assert!(matches!(
            state.planting_api.get_planting(&t1, &theirs.planting_id),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            state.inspection_api.record(&t1, inspection(&theirs.planting_id, 3)),
            Err(ApiError::PermissionDenied(_))
        ));

        // 技术员不能替他人新建
        let mut request = crate::test_helpers::new_planting(1.0);
        request.technician_id = Some("T002".to_string());
        assert!(matches!(
            state.planting_api.create_planting(&t1, request),
            Err(ApiError::PermissionDenied(_))
        ));

        // 列表强制按本人过滤（即使传入其他技术员）
        let listed = state
            .planting_api
            .list_plantings(
                &t1,
                PlantingFilter {
                    technician_id: Some("T002".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].planting_id, mine.planting_id);

        assert_eq!(state.planting_api.count_by_status(&t2).unwrap().standing, 2);
        assert_eq!(state.planting_api.count_by_status(&admin).unwrap().total(), 3);

        // 巡查列表: 只看到本人负责的种植记录下的巡查
        state.inspection_api.record(&t1, inspection(&mine.planting_id, 4)).unwrap();
        state.inspection_api.record(&t2, inspection(&theirs.planting_id, 5)).unwrap();

        let own = state.inspection_api.list(&t1, EventQuery::default()).await.unwrap();
        assert_eq!(own.data.len(), 1);
        assert_eq!(own.data[0].planting_id, mine.planting_id);

        let all = state.inspection_api.list(&admin, EventQuery::default()).await.unwrap();
        assert_eq!(all.data.len(), 2);

        // 管理员可以为任何人负责的记录登记收获
        state.sweep_api.run(&admin, date(2025, 7, 20)).await.unwrap();
        let report = state
            .harvest_api
            .record(
                &admin,
                NewHarvestReport {
                    planting_id: theirs.planting_id.clone(),
                    harvest_date: date(2025, 7, 25),
                    area_harvested_ha: 1.0,
                    total_yield: 3.0,
                    profit: Some(1200.0),
                    damage_quantity: None,
                },
            )
            .unwrap();
        assert_eq!(report.technician_id, "A001");

        // 收获报告按种植记录负责人可见
        let t2_reports = state.harvest_api.list(&t2, EventQuery::default()).await.unwrap();
        assert_eq!(t2_reports.data.len(), 1);
        let t1_reports = state.harvest_api.list(&t1, EventQuery::default()).await.unwrap();
        assert!(t1_reports.data.is_empty());

        let partially = state
            .planting_api
            .list_plantings(
                &admin,
                PlantingFilter {
                    status: Some(PlantingStatus::PartiallyHarvested),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(partially.len(), 1);
    }

    // ==========================================
    // 测试3: 游标分页（默认每页 9 条，按日期倒序）
    // ==========================================
    #[tokio::test]
    async fn test_inspection_cursor_pagination() {
        let (_tmp, state, _) = setup_app();
        let tech = Actor::technician("T001");
        let planting = plant(&state, &tech, 5.0);

        for day in 1..=10 {
            state
                .inspection_api
                .record(&tech, inspection(&planting.planting_id, day))
                .unwrap();
        }

        let first = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    planting_id: Some(planting.planting_id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.data.len(), 9);
        assert_eq!(first.data[0].inspection_date, date(2025, 5, 10));
        assert_eq!(first.next_cursor, Some(9));

        let second = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    planting_id: Some(planting.planting_id.clone()),
                    cursor: 9,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.data[0].inspection_date, date(2025, 5, 1));
        assert_eq!(second.next_cursor, None);

        // 日期区间过滤
        let ranged = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    date_from: Some(date(2025, 5, 3)),
                    date_to: Some(date(2025, 5, 5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ranged.data.len(), 3);

        // 结束日期早于开始日期
        let err = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    date_from: Some(date(2025, 5, 5)),
                    date_to: Some(date(2025, 5, 3)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    // ==========================================
    // 测试4: 分页大小来自 config_kv
    // ==========================================
    #[tokio::test]
    async fn test_page_size_from_config() {
        let (_tmp, state, _) = setup_app();
        let tech = Actor::technician("T001");
        let planting = plant(&state, &tech, 5.0);
        for day in 1..=4 {
            state
                .inspection_api
                .record(&tech, inspection(&planting.planting_id, day))
                .unwrap();
        }

        state
            .config_manager
            .set_config_value(config_keys::LIST_PAGE_SIZE, "3")
            .unwrap();

        let page = state.inspection_api.list(&tech, EventQuery::default()).await.unwrap();
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.next_cursor, Some(3));
    }

    // ==========================================
    // 测试5: 超大游标与超大分页配置不导致崩溃
    // ==========================================
    #[tokio::test]
    async fn test_oversized_cursor_and_page_size() {
        let (_tmp, state, _) = setup_app();
        let tech = Actor::technician("T001");
        let planting = plant(&state, &tech, 5.0);
        for day in 1..=12 {
            state
                .inspection_api
                .record(&tech, inspection(&planting.planting_id, day))
                .unwrap();
        }

        let err = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    cursor: usize::MAX,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = state
            .harvest_api
            .list(
                &tech,
                EventQuery {
                    cursor: usize::MAX,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        // 游标超出数据量: 空页
        let beyond = state
            .inspection_api
            .list(
                &tech,
                EventQuery {
                    cursor: i64::MAX as usize,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.next_cursor, None);

        // 分页配置超过上限时按上限处理
        state
            .config_manager
            .set_config_value(config_keys::LIST_PAGE_SIZE, &usize::MAX.to_string())
            .unwrap();
        let page = state.inspection_api.list(&tech, EventQuery::default()).await.unwrap();
        assert_eq!(page.data.len(), 12);
        assert_eq!(page.next_cursor, None);
    }
}
