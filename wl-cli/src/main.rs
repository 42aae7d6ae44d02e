use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use wl_compiler::Compiler;

#[derive(Parser)]
#[command(name = "wlc")]
#[command(about = "while 语言教学编译器前端：LR(1) 分析过程与三地址码")]
struct Args {
    /// Path to the source file to compile
    file: Option<PathBuf>,

    /// Directory for the generated items.txt / table.csv dumps
    #[arg(long, default_value = ".")]
    dump_dir: PathBuf,
}

const DEFAULT_SAMPLE: &str = "while ( true ) { float b_flag = 1.5 ; if_val = a_var ; while ( b < 1 ) { break ; } continue ; b = a_var ++ ; }";

fn main() -> Result<()> {
    let args = Args::parse();

    let source = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("无法读取源文件 '{}'", path.display()))?,
        None => DEFAULT_SAMPLE.to_string(),
    };

    println!("输入代码: {source}\n");

    let compiler = Compiler::new();
    if let Err(e) = compiler.dump_tables(&args.dump_dir) {
        // Dump failure is reported but never blocks compilation.
        println!("无法写出分析表文件: {e}");
    }

    let result = compiler.run(&source);

    println!("--- 词法分析结果 ---");
    for line in result.lex_table_lines() {
        println!("{line}");
    }
    println!("{}", "-".repeat(100));

    if !result.lex_errors.is_empty() {
        println!("\n--- 错误汇总 ---");
        for err in &result.lex_errors {
            println!("{err}");
        }
        println!("{}", "-".repeat(100));
        return Ok(());
    }

    for line in result.trace_lines() {
        println!("{line}");
    }
    println!("{}", "-".repeat(100));

    if let Some(err) = &result.syntax_error {
        println!("\n--- 错误汇总 ---");
        println!("{err}");
        return Ok(());
    }

    println!("\n--- 生成的三地址码 (TAC) ---");
    for line in result.tac_lines() {
        println!("{line}");
    }
    Ok(())
}
