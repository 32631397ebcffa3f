//! Batch input collection and output naming

use crate::error::{EtlError, EtlResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix added to the stem of a source workbook to name its output
pub const OUTPUT_SUFFIX: &str = "_procesado";

const EXCEL_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// True for `.xlsx`/`.xls` files that are not Office lock files (`~$name`).
pub fn is_spreadsheet(path: &Path) -> bool {
    let is_excel = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXCEL_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)));
    let is_lock_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("~$"));
    is_excel && !is_lock_file
}

/// A spreadsheet file yields itself; a directory yields every spreadsheet
/// below it, sorted.
pub fn collect_spreadsheets(target: &Path) -> EtlResult<Vec<PathBuf>> {
    if target.is_file() {
        if is_spreadsheet(target) {
            return Ok(vec![target.to_path_buf()]);
        }
        return Err(EtlError::InputNotFound(target.to_path_buf()));
    }

    if !target.is_dir() {
        return Err(EtlError::InputNotFound(target.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(target)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_spreadsheet(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    if files.is_empty() {
        return Err(EtlError::NoSpreadsheets(target.to_path_buf()));
    }

    files.sort();
    Ok(files)
}

/// Where the normalized copy of `source` is written.
///
/// Without `output` it lands next to the source as `<stem>_procesado.xlsx`.
/// With a `batch_root`, `output` is a directory and the source's folder
/// below the root is mirrored under it, so `root/2024/inv.xlsx` goes to
/// `output/2024/inv_procesado.xlsx`. Otherwise `output` is the file itself.
pub fn build_destination_path(source: &Path, output: Option<&Path>, batch_root: Option<&Path>) -> PathBuf {
    let file_name = format!(
        "{}{}.xlsx",
        source.file_stem().unwrap_or_default().to_string_lossy(),
        OUTPUT_SUFFIX
    );

    match (output, batch_root) {
        (Some(dir), Some(root)) => {
            let relative = source
                .parent()
                .and_then(|parent| parent.strip_prefix(root).ok())
                .unwrap_or_else(|| Path::new(""));
            dir.join(relative).join(file_name)
        }
        (Some(path), None) => path.to_path_buf(),
        (None, _) => source.with_file_name(file_name),
    }
}

/// Pair every source with its destination, refusing to let two sources
/// share one output file (`inv.xls` next to `inv.xlsx`, for instance).
pub fn plan_destinations(
    sources: &[PathBuf],
    output: Option<&Path>,
    batch_root: Option<&Path>,
) -> EtlResult<Vec<(PathBuf, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut plan = Vec::with_capacity(sources.len());

    for source in sources {
        let destination = build_destination_path(source, output, batch_root);
        if let Some(first) = claimed.insert(destination.clone(), source) {
            return Err(EtlError::OutputCollision {
                first: first.clone(),
                second: source.clone(),
                destination,
            });
        }
        plan.push((source.clone(), destination));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_spreadsheet() {
        assert!(is_spreadsheet(Path::new("inventario.xlsx")));
        assert!(is_spreadsheet(Path::new("VIEJO.XLS")));
        assert!(!is_spreadsheet(Path::new("~$inventario.xlsx")));
        assert!(!is_spreadsheet(Path::new("notas.csv")));
        assert!(!is_spreadsheet(Path::new("sin_extension")));
    }

    #[test]
    fn test_collect_directory_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.xlsx"), b"").unwrap();
        fs::write(dir.path().join("a.xls"), b"").unwrap();
        fs::write(dir.path().join("~$b.xlsx"), b"").unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();
        fs::write(nested.join("c.xlsx"), b"").unwrap();

        let files = collect_spreadsheets(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                nested.join("c.xlsx"),
                dir.path().join("a.xls"),
                dir.path().join("b.xlsx"),
            ]
        );
    }

    #[test]
    fn test_collect_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("stock.xlsx");
        fs::write(&file, b"").unwrap();
        assert_eq!(collect_spreadsheets(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.xlsx");
        assert!(matches!(
            collect_spreadsheets(&missing),
            Err(EtlError::InputNotFound(_))
        ));

        let text = dir.path().join("notes.txt");
        fs::write(&text, b"").unwrap();
        assert!(matches!(
            collect_spreadsheets(&text),
            Err(EtlError::InputNotFound(_))
        ));

        assert!(matches!(
            collect_spreadsheets(dir.path()),
            Err(EtlError::NoSpreadsheets(_))
        ));
    }

    #[test]
    fn test_build_destination_path() {
        let source = Path::new("/data/Inventario.xls");
        assert_eq!(
            build_destination_path(source, None, None),
            PathBuf::from("/data/Inventario_procesado.xlsx")
        );
        assert_eq!(
            build_destination_path(source, Some(Path::new("out.xlsx")), None),
            PathBuf::from("out.xlsx")
        );
        assert_eq!(
            build_destination_path(source, Some(Path::new("/tmp/salida")), Some(Path::new("/data"))),
            PathBuf::from("/tmp/salida/Inventario_procesado.xlsx")
        );
    }

    #[test]
    fn test_same_stem_in_subfolders_keeps_distinct_outputs() {
        let root = Path::new("/data");
        let output = Path::new("/tmp/salida");
        let first = build_destination_path(Path::new("/data/2024/inventario.xlsx"), Some(output), Some(root));
        let second = build_destination_path(Path::new("/data/2025/inventario.xlsx"), Some(output), Some(root));

        assert_ne!(first, second);
        assert_eq!(first, PathBuf::from("/tmp/salida/2024/inventario_procesado.xlsx"));
        assert_eq!(second, PathBuf::from("/tmp/salida/2025/inventario_procesado.xlsx"));
    }

    #[test]
    fn test_plan_rejects_shared_destination() {
        let sources = vec![PathBuf::from("/data/inv.xls"), PathBuf::from("/data/inv.xlsx")];

        let err = plan_destinations(&sources, None, None).unwrap_err();
        match err {
            EtlError::OutputCollision {
                first,
                second,
                destination,
            } => {
                assert_eq!(first, PathBuf::from("/data/inv.xls"));
                assert_eq!(second, PathBuf::from("/data/inv.xlsx"));
                assert_eq!(destination, PathBuf::from("/data/inv_procesado.xlsx"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_plan_pairs_sources_in_order() {
        let sources = vec![
            PathBuf::from("/data/2024/inventario.xlsx"),
            PathBuf::from("/data/2025/inventario.xlsx"),
        ];

        let plan = plan_destinations(&sources, Some(Path::new("/out")), Some(Path::new("/data"))).unwrap();
        assert_eq!(
            plan,
            vec![
                (sources[0].clone(), PathBuf::from("/out/2024/inventario_procesado.xlsx")),
                (sources[1].clone(), PathBuf::from("/out/2025/inventario_procesado.xlsx")),
            ]
        );
    }
}
