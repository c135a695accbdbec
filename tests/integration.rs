use std::io::Write;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use supermarket_eda::analysis::{analyze, load_products};
use supermarket_eda::config::AnalysisConfig;
use supermarket_eda::render::{BAR_CHART_FILE, BOX_PLOT_FILE, ChartOptions, TREEMAP_FILE};
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", contents).unwrap();
    tmp
}

const THREE_ROWS: &str = "\
Titulo,Marca,Preco_Normal,Desconto,Categoria
Manzana,MarcaA,100,5,frutas
Pera,MarcaA,0,3,frutas
Leche,MarcaB,200,0,lacteos
";

#[test]
fn test_three_row_scenario() {
    let tmp = csv_file(THREE_ROWS);
    let (table, summary) = load_products(tmp.path()).unwrap();
    let report = analyze(&table, summary).unwrap();

    assert_eq!(report.price_valid_rows, 2);

    let mut means: Vec<(String, f64)> = report
        .price_stats
        .iter()
        .map(|s| (s.category.clone(), s.mean))
        .collect();
    means.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        means,
        vec![("frutas".to_string(), 100.0), ("lacteos".to_string(), 200.0)]
    );

    let discounts: Vec<(String, f64)> = report
        .discount_by_category
        .iter()
        .map(|d| (d.category.clone(), d.mean_discount))
        .collect();
    assert_eq!(
        discounts,
        vec![("frutas".to_string(), 4.0), ("lacteos".to_string(), 0.0)]
    );
}

#[test]
fn test_brand_pairs_exclude_non_positive_discounts() {
    let tmp = csv_file(
        "Categoria,Marca,Preco_Normal,Desconto\nA,X,1,10\nA,X,1,-5\nA,Y,1,0\n",
    );
    let (table, summary) = load_products(tmp.path()).unwrap();
    let report = analyze(&table, summary).unwrap();

    assert_eq!(report.discount_by_brand.len(), 1);
    let pair = &report.discount_by_brand[0];
    assert_eq!((pair.category.as_str(), pair.brand.as_str()), ("A", "X"));
    assert_eq!(pair.mean_discount, 10.0);
}

#[test]
fn test_half_cent_results_and_quoted_brands() {
    let tmp = csv_file(
        "Categoria,Marca,Preco_Normal,Desconto\n\
         A,\"Don \"\"Pepe\"\"\",1,1\n\
         A,\"Don \"\"Pepe\"\"\",1.25,1.25\n",
    );
    let (table, summary) = load_products(tmp.path()).unwrap();
    let report = analyze(&table, summary).unwrap();

    let stats = &report.price_stats[0];
    assert_eq!((stats.mean, stats.median), (1.12, 1.12));
    assert_eq!(report.discount_by_category[0].mean_discount, 1.12);

    assert_eq!(report.discount_by_brand.len(), 1);
    assert_eq!(report.discount_by_brand[0].brand, "Don \"Pepe\"");
}

#[test]
fn test_highest_dispersion_feeds_box_plot() {
    let tmp = csv_file(
        "Categoria,Marca,Preco_Normal,Desconto\n\
         belleza,Dove,1000,0\n\
         belleza,Dove,50,0\n\
         belleza,Nivea,0,10\n\
         frutas,Lider,10,1\n\
         frutas,Lider,12,0\n\
         solo,Lider,99,0\n",
    );
    let (table, summary) = load_products(tmp.path()).unwrap();
    let report = analyze(&table, summary).unwrap();

    let order: Vec<&str> = report
        .price_stats
        .iter()
        .map(|s| s.category.as_str())
        .collect();
    assert_eq!(order, vec!["belleza", "frutas", "solo"]);
    assert!(report.price_stats[2].std_dev.is_nan());

    let selection = report.highest_dispersion.as_ref().unwrap();
    assert_eq!(selection.category, "belleza");
    assert_eq!(selection.prices, vec![1000.0, 50.0]);
}

#[test]
fn test_run_writes_charts_and_json() {
    let tmp = csv_file(
        "Titulo,Marca,Preco_Normal,Desconto,Categoria\n\
         \"Shampoo, 2x\",Dove,5990,1000,belleza\n\
         Crema,Nivea,1990,0,belleza\n\
         Jabon,Dove,990,200,belleza\n\
         Leche,Soprole,1100,100,lacteos\n\
         Yogurt,Soprole,450,0,lacteos\n",
    );
    let out_dir = tempfile::tempdir().unwrap();
    let json_path = out_dir.path().join("report.json");

    let mut config = AnalysisConfig::new(tmp.path());
    config.charts = Some(ChartOptions {
        out_dir: out_dir.path().join("charts"),
        width: 800,
        height: 600,
    });
    config.json_report = Some(json_path.clone());

    let mut stdout = Vec::new();
    let report = supermarket_eda::run(&config, &mut stdout).unwrap();
    let text = String::from_utf8(stdout).unwrap();

    assert!(text.contains("Dataset preview"));
    assert!(text.contains("Shampoo, 2x"));
    assert!(text.contains("# 5 - Mean discount by category and brand"));

    for file in [BOX_PLOT_FILE, BAR_CHART_FILE, TREEMAP_FILE] {
        let path: PathBuf = out_dir.path().join("charts").join(file);
        assert!(path.exists(), "{} missing", path.display());
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["total_rows"], 5);
    assert_eq!(
        json["highest_dispersion"]["category"],
        report.highest_dispersion.unwrap().category
    );
}

#[test]
fn test_nan_std_dev_serializes_as_null() {
    let tmp = csv_file("Categoria,Marca,Preco_Normal,Desconto\nsolo,X,10,0\n");
    let mut config = AnalysisConfig::new(tmp.path());
    config.charts = None;
    let out_dir = tempfile::tempdir().unwrap();
    let json_path = out_dir.path().join("r.json");
    config.json_report = Some(json_path.clone());

    let report = supermarket_eda::run(&config, &mut std::io::sink()).unwrap();
    assert!(report.highest_dispersion.is_none());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert!(json["price_stats"][0]["std_dev"].is_null());
}

#[test]
fn test_missing_file_fails_with_message() {
    let config = AnalysisConfig::new("/no/such/dir/base.csv");
    let err = supermarket_eda::run(&config, &mut std::io::sink()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("could not load /no/such/dir/base.csv"));
}
