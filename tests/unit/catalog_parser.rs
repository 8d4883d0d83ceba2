//! Unit tests for catalog query building and response mapping

use gamelog_harvester::fetcher::catalog_parser::{build_query, parse_catalog_response, release_year};
use gamelog_harvester::fetcher::FetcherError;
use gamelog_harvester::GameRecord;

#[test]
fn test_query_matches_wire_format() {
    assert_eq!(
        build_query(&[1, 2, 3], 500),
        "fields name,first_release_date,genres.name,collections.name,\
         involved_companies.company.name,involved_companies.*,platforms.name;\
         where id = (1, 2, 3);limit 500;"
    );
}

#[test]
fn test_full_game_mapping() {
    let body = r#"[{
        "id": 1942,
        "name": "The Witcher 3: Wild Hunt",
        "first_release_date": 1431993600,
        "genres": [{"id": 12, "name": "Role-playing (RPG)"}, {"id": 31, "name": "Adventure"}],
        "collections": [{"id": 3, "name": "The Witcher"}],
        "platforms": [{"id": 6, "name": "PC (Microsoft Windows)"}, {"id": 48, "name": "PlayStation 4"}],
        "involved_companies": [
            {"id": 1, "company": {"id": 908, "name": "CD Projekt RED"}, "developer": true, "publisher": false},
            {"id": 2, "company": {"id": 1045, "name": "CD Projekt"}, "developer": true, "publisher": true},
            {"id": 3, "company": {"id": 70, "name": "Warner Bros."}, "developer": false, "publisher": true},
            {"id": 4, "company": {"id": 99, "name": "Porting House"}, "developer": false, "publisher": false}
        ]
    }]"#;

    let records = parse_catalog_response(body).unwrap();
    assert_eq!(records.len(), 1);
    let game = &records[0];
    assert_eq!(game.game_id, 1942);
    assert_eq!(game.title.as_deref(), Some("The Witcher 3: Wild Hunt"));
    assert_eq!(game.release_year, Some(2015));
    assert_eq!(
        game.genres,
        Some(vec!["Role-playing (RPG)".to_string(), "Adventure".to_string()])
    );
    assert_eq!(game.series, Some(vec!["The Witcher".to_string()]));
    assert_eq!(
        game.developers,
        Some(vec!["CD Projekt RED".to_string(), "CD Projekt".to_string()])
    );
    assert_eq!(
        game.publishers,
        Some(vec!["CD Projekt".to_string(), "Warner Bros.".to_string()])
    );
    assert_eq!(game.platforms.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_sparse_game_omits_fields() {
    let records = parse_catalog_response(r#"[{"id": 7, "name": "Obscure"}]"#).unwrap();
    assert_eq!(
        records[0],
        GameRecord {
            game_id: 7,
            title: Some("Obscure".to_string()),
            ..Default::default()
        }
    );
    let json = serde_json::to_string(&records[0]).unwrap();
    assert_eq!(json, r#"{"game_id":7,"title":"Obscure"}"#);
}

#[test]
fn test_response_order_is_preserved() {
    let records = parse_catalog_response(r#"[{"id": 3}, {"id": 1}, {"id": 2}]"#).unwrap();
    let ids: Vec<u64> = records.iter().map(|r| r.game_id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[test]
fn test_error_object_is_parse_error() {
    let body = r#"{"title": "Syntax Error", "status": 400}"#;
    assert!(matches!(parse_catalog_response(body), Err(FetcherError::Parse(_))));
}

#[test]
fn test_release_year_boundaries() {
    // 2020-01-01T00:00:00Z
    assert_eq!(release_year(1_577_836_800), Some(2020));
    // one second earlier
    assert_eq!(release_year(1_577_836_799), Some(2019));
}
