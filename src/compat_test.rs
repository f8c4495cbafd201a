use serde_json::json;

use super::*;

#[test]
fn username_substring_matches_any_case() {
    assert!(legacy_admin_heuristic(&json!({ "id": 7, "username": "superadmin" })));
    assert!(legacy_admin_heuristic(&json!({ "id": 7, "username": "SysAdmin" })));
    assert!(legacy_admin_heuristic(&json!({ "id": 7, "username": "admin" })));
}

#[test]
fn first_user_id_matches() {
    assert!(legacy_admin_heuristic(&json!({ "id": 1, "username": "carol" })));
    assert!(legacy_admin_heuristic(&json!({ "id": 1.0 })));
}

#[test]
fn ordinary_users_do_not_match() {
    assert!(!legacy_admin_heuristic(&json!({ "id": 2, "username": "carol" })));
    assert!(!legacy_admin_heuristic(&json!({ "id": "1", "username": "carol" })));
    assert!(!legacy_admin_heuristic(&json!({ "username": "adm" })));
    assert!(!legacy_admin_heuristic(&json!({})));
    assert!(!legacy_admin_heuristic(&json!(null)));
}
