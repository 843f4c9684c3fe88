// tests/snapshot_import.rs
//
// Запуск только этого файла:
//   cargo test --test snapshot_import -- --nocapture
//
// Покрываем:
// 1) Merge-import никогда не освобождает номера (монотонность).
// 2) Replace-import может сузить резервации: {1,2,3} + файл только с 2 -> следующий 1.
// 3) Import заменяет все партиции и становится новым baseline.
// 4) restore_to_baseline идемпотентен.
// 5) Режим просмотра бэкапа: мутации запрещены до discard/commit.
// 6) Отсутствующий файл импорта: ошибка, состояние не меняется.
// 7) Просмотр бэкапа показывает ровно то, что примет commit.
// 8) Restore предыдущего STARTUP между сессиями (как в CLI: один open на команду).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use pcelica::persist::records::encode_records;
use pcelica::{
    format_doc_number, Gender, ImportPolicy, PersistReason, Registrant, RegistrantDraft,
    Registry, RegistryConfig, RegistryError,
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("pcelica-snap-{prefix}-{pid}-{t}-{id}"))
}

fn open(root: &Path) -> Result<Registry> {
    Ok(Registry::open_with_config(RegistryConfig::at(root))?)
}

fn reg_row(id: &str, first: &str, year: i32, seq: u32) -> Registrant {
    Registrant {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: "Vehabović".to_string(),
        gender: Gender::Male,
        birth_date: None,
        birth_place: "Maglaj".to_string(),
        residence_city: "Maglaj".to_string(),
        colonies: 9,
        doc_number: format_doc_number("14", seq, year),
        seq_number: seq,
        year,
        certificate_date: None,
    }
}

fn write_import(path: &Path, rows: &[Registrant]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_records(rows)?)?;
    Ok(())
}

fn seqs(reg: &Registry, year: i32) -> Vec<u32> {
    reg.reserved_set(year).into_iter().collect()
}

#[test]
fn merge_import_never_frees_numbers() -> Result<()> {
    let root = unique_root("merge");
    let reg = open(&root)?;
    for n in ["Adnan", "Belma", "Cazim"] {
        reg.register(2023, RegistrantDraft::new(n, "Zukić"))?;
    }
    let file = root.join("in").join("only2.csv");
    write_import(&file, &[reg_row("x2", "Vedad", 2023, 2), reg_row("x9", "Zlatan", 2024, 9)])?;

    let out = reg.import_as_main_merge(&file)?;
    assert_eq!(out.imported, 2);
    assert_eq!(out.report.reason, PersistReason::Import);
    assert_eq!(seqs(&reg, 2023), vec![1, 2, 3]);
    assert_eq!(seqs(&reg, 2024), vec![9]);
    assert_eq!(reg.reserve_next(2023)?, 4);

    // partitions are exactly the file
    let ids: Vec<String> = reg.all_registrants().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["x2".to_string(), "x9".to_string()]);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn replace_import_can_shrink_reservations() -> Result<()> {
    let root = unique_root("replace");
    let reg = open(&root)?;
    for n in ["Adnan", "Belma", "Cazim"] {
        reg.register(2023, RegistrantDraft::new(n, "Zukić"))?;
    }
    reg.register(2022, RegistrantDraft::new("Dalila", "Zukić"))?;
    let file = root.join("in").join("only2.csv");
    write_import(&file, &[reg_row("x2", "Vedad", 2023, 2)])?;

    let out = reg.import_as_main_replace(&file)?;
    assert_eq!(out.report.reason, PersistReason::ImportReplace);
    assert_eq!(seqs(&reg, 2023), vec![2]);
    assert!(seqs(&reg, 2022).is_empty(), "years absent from the file are cleared");
    assert_eq!(reg.reserve_next(2023)?, 1);
    assert_eq!(reg.reserve_next(2023)?, 3);

    // the imported state survives a reopen
    drop(reg);
    let reg = open(&root)?;
    assert_eq!(seqs(&reg, 2023), vec![1, 2, 3]);
    assert_eq!(reg.all_registrants().len(), 1);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn import_becomes_the_new_baseline() -> Result<()> {
    let root = unique_root("baseline");
    let reg = open(&root)?;
    reg.register(2023, RegistrantDraft::new("Elma", "Zukić"))?;
    let file = root.join("in").join("base.csv");
    write_import(&file, &[reg_row("x1", "Faruk", 2023, 1)])?;

    reg.import_as_main(&file, ImportPolicy::Replace)?;
    reg.register(2023, RegistrantDraft::new("Gordana", "Zukić"))?;
    assert_eq!(reg.all_registrants().len(), 2);

    let report = reg.restore_to_baseline()?;
    assert_eq!(report.reason, PersistReason::RestoreStartup);
    let ids: Vec<String> = reg.all_registrants().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["x1".to_string()]);
    assert_eq!(seqs(&reg, 2023), vec![1]);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn restore_to_baseline_is_idempotent() -> Result<()> {
    let root = unique_root("restore");
    {
        let reg = open(&root)?;
        reg.register(2024, RegistrantDraft::new("Haris", "Zukić"))?;
    }
    let reg = open(&root)?;
    let baseline = reg.all_registrants();
    let baseline_seqs = seqs(&reg, 2024);

    reg.register(2024, RegistrantDraft::new("Irma", "Zukić"))?;
    let first = baseline[0].clone();
    reg.delete_registrant(2024, &first.id)?;
    assert_ne!(reg.all_registrants(), baseline);

    reg.restore_to_baseline()?;
    assert_eq!(reg.all_registrants(), baseline);
    assert_eq!(seqs(&reg, 2024), baseline_seqs);

    reg.restore_to_baseline()?;
    assert_eq!(reg.all_registrants(), baseline);
    assert_eq!(seqs(&reg, 2024), baseline_seqs);

    let restores = reg
        .list_backups()?
        .into_iter()
        .filter(|b| b.reason == Some(PersistReason::RestoreStartup))
        .count();
    assert_eq!(restores, 2);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn restore_previous_startup_undoes_the_last_session() -> Result<()> {
    let root = unique_root("prev-startup");
    {
        let reg = open(&root)?;
        assert!(reg.previous_startup_backup()?.is_none());
        assert!(reg.restore_previous_startup()?.is_none());
    }
    {
        let reg = open(&root)?;
        reg.register(2024, RegistrantDraft::new("ana", "anic"))?;
    }
    {
        let reg = open(&root)?;
        assert_eq!(reg.all_registrants().len(), 1);
        let out = reg
            .restore_previous_startup()?
            .ok_or_else(|| anyhow::anyhow!("no earlier STARTUP backup"))?;
        assert_eq!(out.imported, 0);
        assert_eq!(out.report.reason, PersistReason::RestoreStartup);
        assert!(reg.registrants_for_year(2024).is_empty());
        // the number handed out to Ana stays taken
        assert_eq!(seqs(&reg, 2024), vec![1]);
    }

    let reg = open(&root)?;
    assert!(reg.registrants_for_year(2024).is_empty());
    let next = reg.register(2024, RegistrantDraft::new("Bakir", "Anić"))?;
    assert_eq!(next.seq_number, 2);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn viewing_a_backup_blocks_mutations() -> Result<()> {
    let root = unique_root("view");
    let reg = open(&root)?;
    let a = reg.register(2024, RegistrantDraft::new("Jasmin", "Zukić"))?;
    reg.register(2024, RegistrantDraft::new("Kemal", "Zukić"))?;

    let add_backups: Vec<_> = reg
        .list_backups()?
        .into_iter()
        .filter(|b| b.reason == Some(PersistReason::Add))
        .collect();
    assert_eq!(add_backups.len(), 2);
    // the backup holding only Jasmin
    let one = add_backups
        .iter()
        .find(|b| {
            fs::read_to_string(&b.path)
                .map(|s| !s.contains("Kemal"))
                .unwrap_or(false)
        })
        .expect("first ADD backup");

    let view = reg.open_backup_view(&one.path)?;
    assert_eq!(view.len(), 1);
    assert_eq!(view.search(2024, "jasmin").len(), 1);
    assert!(reg.is_viewing());

    let blocked = [
        reg.register(2024, RegistrantDraft::new("Lana", "Zukić")).err(),
        reg.reserve_next(2024).err(),
        reg.delete_registrant(2024, &a.id).err(),
        reg.restore_to_baseline().err(),
        reg.import_as_main_merge(&one.path).err(),
        reg.restore_previous_startup().err(),
    ];
    for e in blocked {
        assert!(matches!(e, Some(RegistryError::ReadOnlyView)));
        assert!(e.is_some_and(|e| !e.is_validation()));
    }
    // live state untouched, queries still work
    assert_eq!(reg.registrants_for_year(2024).len(), 2);

    reg.discard_view()?;
    assert!(matches!(reg.discard_view(), Err(RegistryError::NotViewing)));
    assert!(matches!(
        reg.commit_view(ImportPolicy::Merge),
        Err(RegistryError::NotViewing)
    ));

    // commit path: back to Live with the backup as main state
    reg.open_backup_view(&one.path)?;
    let out = reg.commit_view(ImportPolicy::Replace)?;
    assert_eq!(out.imported, 1);
    assert!(!reg.is_viewing());
    assert_eq!(seqs(&reg, 2024), vec![1]);
    assert_eq!(reg.register(2024, RegistrantDraft::new("Lana", "Zukić"))?.seq_number, 2);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn missing_import_file_changes_nothing() -> Result<()> {
    let root = unique_root("missing");
    let reg = open(&root)?;
    reg.register(2024, RegistrantDraft::new("Mubera", "Zukić"))?;
    let before = (reg.all_registrants(), seqs(&reg, 2024), reg.list_backups()?.len());

    assert!(reg.import_as_main_replace(&root.join("nema.csv")).is_err());
    assert!(reg.open_backup_view(&root.join("nema.csv")).is_err());
    assert!(!reg.is_viewing());

    let after = (reg.all_registrants(), seqs(&reg, 2024), reg.list_backups()?.len());
    assert_eq!(before, after);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn import_skips_rows_that_break_invariants() -> Result<()> {
    let root = unique_root("dups");
    let reg = open(&root)?;
    let file = root.join("in").join("dups.csv");
    let mut same_name = reg_row("x3", "Nedim", 2023, 3);
    same_name.first_name = "NEDIM".into();
    write_import(
        &file,
        &[
            reg_row("x1", "Nedim", 2023, 1),
            reg_row("x1", "Omar", 2023, 2),
            reg_row("x2", "Pašo", 2023, 1),
            same_name,
        ],
    )?;

    // the view already shows only what a commit would adopt
    let view = reg.open_backup_view(&file)?;
    assert_eq!(view.len(), 1);
    let lines: Vec<usize> = view.skipped().iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![3, 4, 5]);
    assert_eq!(view.search(2023, "nedim").len(), 1);
    reg.discard_view()?;

    let out = reg.import_as_main_merge(&file)?;
    assert_eq!(out.imported, 1);
    assert_eq!(out.skipped.len(), 3);
    assert_eq!(seqs(&reg, 2023), vec![1]);

    drop(reg);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}
