use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

fn main() {
    let mut img = RgbImage::new(800, 600);

    // Dark textured table top
    for y in 0..600 {
        for x in 0..800 {
            let v = 30 + ((x * 7 + y * 13) % 20) as u8;
            img.put_pixel(x, y, Rgb([v, v, v + 5]));
        }
    }

    // A brass-coloured coin, slightly off centre
    draw_filled_circle_mut(&mut img, (430, 280), 170, Rgb([205, 170, 90]));

    img.save("test_coin.jpg").unwrap();
    println!("Created test_coin.jpg (800x600 coin at (430, 280), radius 170)");
}
