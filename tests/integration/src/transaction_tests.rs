//! End-to-end properties of the fragment transaction
//!
//! Each test drives the real controller, engine and trash against files in a
//! temporary directory: check -> fix -> (rollback).

use fragment_core::{
    Category, Error, FragmentController, FragmentRequest, Phase, Status, TransactionId, Trash,
    UndoAction, UnfixableReason,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn txn(id: &str) -> TransactionId {
    TransactionId::new(id).unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[cfg(unix)]
fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn fix_twice_changes_once() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "hosts", "127.0.0.1 localhost\n");
    let request = FragmentRequest::present(&path, "X", "hello");
    let controller = FragmentController::new();

    let first = controller
        .evaluate(&request, Phase::Fix, &txn("aaaaaaaa-1"))
        .unwrap();
    let after_first = fs::read(&path).unwrap();

    let second = controller
        .evaluate(&request, Phase::Fix, &txn("bbbbbbbb-2"))
        .unwrap();

    assert_eq!(first.status, Status::Applied);
    assert_eq!(second.status, Status::AlreadyCorrect);
    assert_eq!(fs::read(&path).unwrap(), after_first);
    assert!(!Trash::has_backup(&path, "bbbbbbbb"));
}

#[test]
fn check_after_fix_is_already_correct() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "app.conf", "");
    let request = FragmentRequest::present(&path, "X", "hello").with_attr("by", "ops");
    let controller = FragmentController::new();

    controller
        .evaluate(&request, Phase::Fix, &txn("11111111"))
        .unwrap();
    let check = controller
        .evaluate(&request, Phase::Check, &txn("22222222"))
        .unwrap();

    assert_eq!(check.status, Status::AlreadyCorrect);
    assert!(check.undo.is_none());
    assert!(check.diff.is_none());
}

// =============================================================================
// Unfixable precondition
// =============================================================================

#[cfg(unix)]
#[rstest]
#[case::missing("missing", UnfixableReason::NotFound)]
#[case::symlink("link", UnfixableReason::NotRegularFile)]
#[case::directory("subdir", UnfixableReason::NotRegularFile)]
fn unfixable_targets_are_left_alone(
    #[case] name: &str,
    #[case] reason: UnfixableReason,
    #[values(Phase::Check, Phase::Fix)] phase: Phase,
) {
    let dir = TempDir::new().unwrap();
    let real = write(&dir, "real", "content\n");
    std::os::unix::fs::symlink(&real, dir.path().join("link")).unwrap();
    fs::create_dir(dir.path().join("subdir")).unwrap();

    let target = dir.path().join(name);
    let old_backup = write(&dir, &format!(".{name}.cccccccc.trash"), "older backup\n");
    let backup_mtime = fs::metadata(&old_backup).unwrap().modified().unwrap();

    let err = FragmentController::new()
        .evaluate(
            &FragmentRequest::present(&target, "X", "hello"),
            phase,
            &txn("cccccccc"),
        )
        .unwrap_err();

    match err {
        Error::Unfixable { reason: got, .. } => assert_eq!(got, reason),
        other => panic!("expected Unfixable, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&old_backup).unwrap(), "older backup\n");
    assert_eq!(
        fs::metadata(&old_backup).unwrap().modified().unwrap(),
        backup_mtime
    );
    assert_eq!(fs::read_to_string(&real).unwrap(), "content\n");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
}

// =============================================================================
// Undo recipe round-trip
// =============================================================================

#[cfg(unix)]
#[rstest]
#[case::insert(true)]
#[case::delete(false)]
fn undo_recipe_restores_bytes_and_mode(#[case] should_exist: bool) {
    let dir = TempDir::new().unwrap();
    let original = "alpha\n# BEGIN fragment X\nold\n# END fragment X\nomega";
    let path = write(&dir, "app.conf", original);
    set_mode(&path, 0o600);

    let mut request = FragmentRequest::present(&path, "X", "new");
    request.should_exist = should_exist;
    let id = txn("d00dfeed-77");
    let controller = FragmentController::new();

    let check = controller.evaluate(&request, Phase::Check, &id).unwrap();
    let recipe = check.undo.expect("pending check carries a recipe");
    assert_eq!(recipe.steps()[0].action, UndoAction::Untrash);
    assert_eq!(recipe.steps()[1].action, UndoAction::Trash);

    let fix = controller.evaluate(&request, Phase::Fix, &id).unwrap();
    assert_eq!(fix.status, Status::Applied);
    assert_ne!(fs::read_to_string(&path).unwrap(), original);

    recipe.rollback(&Trash::new()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(mode_of(&path), 0o600);
    assert!(Trash::has_backup(&path, "d00dfeedn"));
}

#[test]
fn persisted_recipe_still_rolls_back() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "motd", "welcome\n");
    let request = FragmentRequest::present(&path, "banner", "Authorized use only.");
    let id = txn("abcdef0123");
    let controller = FragmentController::new();

    let check = controller.evaluate(&request, Phase::Check, &id).unwrap();
    let stored = dir.path().join("undo.json");
    fragment_fs::ConfigStore::new()
        .save(&stored, check.undo.as_ref().unwrap())
        .unwrap();

    controller.evaluate(&request, Phase::Fix, &id).unwrap();

    let recipe: fragment_core::UndoRecipe = fragment_fs::ConfigStore::new().load(&stored).unwrap();
    recipe.rollback(&Trash::new()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "welcome\n");
}

#[test]
fn recipe_from_another_transaction_keeps_rewritten_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "hosts", "127.0.0.1 localhost\n");
    let request = FragmentRequest::present(&path, "db", "10.0.0.5 db");
    let controller = FragmentController::new();

    let check = controller
        .evaluate(&request, Phase::Check, &txn("aaaaaaaa"))
        .unwrap();
    controller
        .evaluate(&request, Phase::Fix, &txn("bbbbbbbb"))
        .unwrap();
    let rewritten = fs::read_to_string(&path).unwrap();

    let err = check.undo.unwrap().rollback(&Trash::new()).unwrap_err();

    assert!(matches!(err, fragment_fs::Error::BackupMissing { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), rewritten);
    assert!(Trash::has_backup(&path, "bbbbbbbb"));
    assert!(!Trash::has_backup(&path, "aaaaaaaan"));
}

// =============================================================================
// Permission preservation
// =============================================================================

#[cfg(unix)]
#[test]
fn insert_keeps_mode_0640() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "secrets.conf", "a = 1\n");
    set_mode(&path, 0o640);

    FragmentController::new()
        .evaluate(
            &FragmentRequest::present(&path, "X", "b = 2"),
            Phase::Fix,
            &txn("0640mode"),
        )
        .unwrap();

    assert_eq!(mode_of(&path), 0o640);
}

#[cfg(unix)]
#[test]
fn owner_restore_never_fails_the_fix() {
    use std::os::unix::fs::MetadataExt;

    let dir = TempDir::new().unwrap();
    let path = write(&dir, "owned", "x\n");
    let before = fs::metadata(&path).unwrap();

    let eval = FragmentController::new()
        .evaluate(
            &FragmentRequest::present(&path, "X", "y"),
            Phase::Fix,
            &txn("ownerxyz"),
        )
        .unwrap();

    // Our own file: the temp file is created with the same owner, so no
    // chown is needed and no warning is recorded.
    assert_eq!(eval.status, Status::Applied);
    assert!(eval.warnings.is_empty(), "warnings: {:?}", eval.warnings);
    let after = fs::metadata(&path).unwrap();
    assert_eq!((after.uid(), after.gid()), (before.uid(), before.gid()));
}

// =============================================================================
// Deletion symmetry
// =============================================================================

#[test]
fn insert_then_delete_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let original = "line one\nline two\n";
    let path = write(&dir, "f", original);
    let controller = FragmentController::new();

    let insert = FragmentRequest::present(&path, "X", "hello");
    let delete = FragmentRequest::absent(&path, "X", "hello");

    controller
        .evaluate(&insert, Phase::Fix, &txn("10000000"))
        .unwrap();
    let removed = controller
        .evaluate(&delete, Phase::Fix, &txn("20000000"))
        .unwrap();
    let again = controller
        .evaluate(&delete, Phase::Fix, &txn("30000000"))
        .unwrap();

    assert_eq!(removed.status, Status::Applied);
    assert_eq!(again.status, Status::AlreadyCorrect);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, original);
    assert!(!text.contains("fragment X"));
}

// =============================================================================
// Error isolation
// =============================================================================

#[test]
fn conflicting_fragment_blocks_fix() {
    let dir = TempDir::new().unwrap();
    let original = "// BEGIN fragment X\nhello\n// END fragment X\n";
    let path = write(&dir, "f", original);

    let err = FragmentController::new()
        .evaluate(
            &FragmentRequest::present(&path, "X", "hello"),
            Phase::Fix,
            &txn("eeeeeeee"),
        )
        .unwrap_err();

    assert_eq!(err.category(), Category::EngineRejected);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert!(!Trash::has_backup(&path, "eeeeeeee"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn unterminated_fragment_blocks_delete() {
    let dir = TempDir::new().unwrap();
    let original = "# BEGIN fragment X\nhello\n";
    let path = write(&dir, "f", original);

    let err = FragmentController::new()
        .evaluate(
            &FragmentRequest::absent(&path, "X", "hello"),
            Phase::Fix,
            &txn("ffffffff"),
        )
        .unwrap_err();

    assert_eq!(err.category(), Category::EngineRejected);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

// =============================================================================
// Rollback property
// =============================================================================

fn file_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z0-9 =.]{0,16}", 0..6),
        any::<bool>(),
    )
        .prop_map(|(lines, trailing_newline)| {
            let mut text = lines.join("\n");
            if trailing_newline && !text.is_empty() {
                text.push('\n');
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fix_then_rollback_restores_original(text in file_text(), payload in "[a-z ]{1,20}", top in any::<bool>()) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "target", &text);
        let mut request = FragmentRequest::present(&path, "p", payload);
        request.format.top_style = top;
        let id = txn("5eed5eed");
        let controller = FragmentController::new();

        let check = controller.evaluate(&request, Phase::Check, &id).unwrap();
        prop_assert_eq!(check.status, Status::Pending);

        controller.evaluate(&request, Phase::Fix, &id).unwrap();
        check.undo.unwrap().rollback(&Trash::new()).unwrap();

        prop_assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }
}
