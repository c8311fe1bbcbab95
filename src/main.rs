//! # Pagina CLI
//!
//! Usage:
//!   pagina input.json -o pages.json
//!   echo '{ ... }' | pagina -o pages.json
//!   pagina input.json --max-shadow-pages 2 --rtl
//!   pagina input.json --font "Noto Naskh Arabic" fonts/NotoNaskhArabic.ttf
//!   pagina --example > overflow.json
//!
//! `--font FAMILY PATH` registers a font file under a family name; the
//! family comes first. Repeat it for more fonts.
//!
//! Logging goes to stderr; set `RUST_LOG=debug` to see page decisions.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use pagina::config::{EngineBuilder, ShadowDirection};
use pagina::text::bidi::UnicodeBidiSplitter;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])
            .unwrap_or_else(|e| fail(&format!("cannot read {}: {}", args[1], e)))
    } else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fail(&format!("cannot read stdin: {}", e)));
        buf
    };

    let output_path = flag_value(&args, "-o").unwrap_or_else(|| "pages.json".to_string());

    let mut builder = EngineBuilder::new().use_bidi_splitter(UnicodeBidiSplitter);
    if let Some(n) = flag_value(&args, "--max-shadow-pages") {
        let n = n
            .parse()
            .unwrap_or_else(|_| fail(&format!("--max-shadow-pages expects a number, got '{}'", n)));
        builder = builder.max_shadow_pages(n);
    }
    if args.iter().any(|a| a == "--rtl") {
        builder = builder.shadow_direction(ShadowDirection::Rtl);
    }
    for font in args.windows(3).filter(|w| w[0] == "--font") {
        let (family, path) = (&font[1], &font[2]);
        builder = builder.use_font(path, family);
    }

    let mut engine = builder.build().unwrap_or_else(|e| fail(&e.to_string()));
    let pagination = engine
        .paginate_json(&input)
        .unwrap_or_else(|e| fail(&e.to_string()));

    let json = serde_json::to_string_pretty(&pagination).unwrap_or_else(|e| fail(&e.to_string()));
    fs::write(&output_path, json)
        .unwrap_or_else(|e| fail(&format!("cannot write {}: {}", output_path, e)));

    eprintln!(
        "✓ {} page(s) ({} shadow) written to {}",
        pagination.pages.len(),
        pagination.shadow_pages().count(),
        output_path
    );
    for d in &pagination.diagnostics {
        eprintln!("  ! {}: {}", d.node.as_deref().unwrap_or("<anonymous>"), d.unsupported);
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn fail(message: &str) -> ! {
    eprintln!("✗ {}", message);
    process::exit(1);
}

fn example_json() -> &'static str {
    r##"{
  "page": {
    "size": { "Custom": { "width": 400, "height": 300 } },
    "margin": { "top": 30, "right": 30, "bottom": 30, "left": 30 }
  },
  "children": [
    {
      "kind": { "type": "Text", "content": "Page counter(page) of counter(pages)" },
      "style": { "position": { "Running": "Header" }, "fontSize": 9 },
      "bounds": { "x": 30, "y": 10, "width": 340, "height": 12 }
    },
    {
      "kind": { "type": "Text", "content": "This line is far too wide for the page and will not wrap." },
      "style": { "whiteSpace": "NoWrap", "fontSize": 12 },
      "bounds": { "x": 0, "y": 0, "width": 340, "height": 14.4 }
    },
    {
      "kind": { "type": "Block" },
      "style": { "backgroundColor": { "r": 0.9, "g": 0.9, "b": 1.0, "a": 1.0 }, "overflow": "Hidden" },
      "bounds": { "x": 0, "y": 30, "width": 200, "height": 40 },
      "children": [
        {
          "kind": { "type": "Text", "content": "Clipped by its parent, never a shadow page." },
          "style": { "whiteSpace": "NoWrap" },
          "bounds": { "x": 0, "y": 0, "width": 200, "height": 14.4 }
        }
      ]
    }
  ]
}
"##
}
