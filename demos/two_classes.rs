use glyph_trainer::{BinaryImage, Encoding, OcrNetwork, Segmentation, TrainConfig};

fn glyph(rows: &[&str]) -> BinaryImage {
    BinaryImage::from_ascii(rows).expect("demo glyphs are not empty")
}

fn main() {
    let bar = [
        glyph(&["#", "#", "#", "#", "#"]),
        glyph(&["#", "#", "#", "#"]),
        glyph(&["#", "#", "#", "#", "#", "#"]),
    ];
    let dash = [
        glyph(&["#####"]),
        glyph(&["####"]),
        glyph(&["######"]),
    ];

    let mut ocr = OcrNetwork::with_classes(Encoding::OneHot, ["|", "-"]);
    ocr.network_mut().add_layer(6);
    for image in bar {
        ocr.add_sample("|", image).expect("class exists");
    }
    for image in dash {
        ocr.add_sample("-", image).expect("class exists");
    }

    let config = TrainConfig { learning_rate: 0.5, momentum: 0.3, max_cycles: 2000, ..TrainConfig::default() };
    let history = ocr.train(&config).expect("training succeeds");
    for stats in history.iter().step_by(200) {
        println!("Cycle {}: error = {:.6}", stats.cycle, stats.train_error);
    }

    let line = glyph(&[
        "..#.......",
        "..#.......",
        "..#..#####",
        "..#.......",
        "..#.......",
    ]);
    let readings = ocr.recognize_string(&line, Segmentation::Connected, 0.5).expect("recognition succeeds");
    println!("{} -> {:?}", ocr.network(), readings);
}
