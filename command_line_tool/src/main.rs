use clap::Parser;
use std::path::{Path, PathBuf};

use boxmap::page_composer::{compose_pages, OutputDpi};
use boxmap::photo::Photo;
use boxmap::template::Template;

use image::open;

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "CLI for mapping photo regions onto printable papercraft box pages."
)]
struct Args {
    /// Outside photo filename (source slot 0)
    #[arg()]
    outside: String,

    /// Inside photo filename (source slot 1)
    #[arg()]
    inside: String,

    /// Template JSON filename
    #[arg()]
    template: String,

    /// Directory the four output pages are written into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Output resolution for the A4 pages: 200, 300 or 600 DPI
    #[arg(long, default_value_t = 300)]
    dpi: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let dpi = match args.dpi {
        200 => OutputDpi::Dpi200,
        300 => OutputDpi::Dpi300,
        600 => OutputDpi::Dpi600,
        _ => {
            eprintln!("Invalid dpi: {}. Use 200, 300 or 600.", args.dpi);
            std::process::exit(1);
        }
    };

    let template_json =
        std::fs::read_to_string(&args.template).expect("Could not read template file");
    let template = match Template::from_json(&template_json) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("Err: {e}");
            std::process::exit(1);
        }
    };

    let outside = read_photo(&args.outside);
    let inside = read_photo(&args.inside);

    let result = compose_pages(&outside, &inside, &template, dpi);

    std::fs::create_dir_all(&args.output_dir).expect("Could not create output directory");
    let outputs = [
        ("output_page1.png", &result.pages[0]),
        ("output_page2.png", &result.pages[1]),
        ("output_outside_mapping.png", &result.previews[0]),
        ("output_inside_mapping.png", &result.previews[1]),
    ];
    for (name, photo) in outputs {
        save_photo(photo, &args.output_dir.join(name));
    }
    println!("Done.");
}

pub fn read_photo(filename: &str) -> Photo {
    println!("Reading image file: {filename}");
    let img = open(filename).expect("Could not load image");
    Photo::from_image(img)
}

pub fn save_photo(photo: &Photo, path: &Path) {
    println!("Writing image {}", path.display());
    let img = image::RgbaImage::from_raw(
        photo.width as u32,
        photo.height as u32,
        photo.img_data.clone(),
    )
    .expect("Pixel buffer does not match photo dimensions");
    img.save(path).expect("Failed to write image file");
}
