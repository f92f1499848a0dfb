//! Classifier input preprocessing
//!
//! Each base classifier was trained with its own resize/normalise recipe and
//! the fusion model was fitted on scores produced with exactly those recipes.
//! The two recipes must stay separate values.

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Resize and normalisation recipe for one classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessRecipe {
    pub width: u32,
    pub height: u32,
    /// Per-channel mean (RGB), applied after scaling to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel standard deviation (RGB)
    pub std: [f32; 3],
}

impl PreprocessRecipe {
    /// ResNet-50 recipe: 224x224 bilinear, ImageNet statistics
    pub const RESNET: PreprocessRecipe = PreprocessRecipe {
        width: 224,
        height: 224,
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    /// ViT recipe: 224x224 bilinear, mean 0.5 / std 0.5
    pub const VIT: PreprocessRecipe = PreprocessRecipe {
        width: 224,
        height: 224,
        mean: [0.5, 0.5, 0.5],
        std: [0.5, 0.5, 0.5],
    };

    /// Tensor shape produced by `apply` (NCHW, batch of one)
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }

    /// Resize and normalise `image` into a planar NCHW buffer
    pub fn apply(&self, image: &RgbImage) -> Vec<f32> {
        let resized = if image.dimensions() == (self.width, self.height) {
            image.clone()
        } else {
            imageops::resize(image, self.width, self.height, FilterType::Triangle)
        };

        let plane = (self.width * self.height) as usize;
        let mut data = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let offset = (y * self.width + x) as usize;
            for channel in 0..3 {
                let value = pixel.0[channel] as f32 / 255.0;
                data[channel * plane + offset] = (value - self.mean[channel]) / self.std[channel];
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_is_planar_and_sized() {
        let small = RgbImage::from_pixel(64, 48, Rgb([255, 0, 128]));
        assert_eq!(PreprocessRecipe::VIT.apply(&small).len(), 3 * 224 * 224);
        assert_eq!(PreprocessRecipe::VIT.input_shape(), [1, 3, 224, 224]);

        let image = RgbImage::from_pixel(224, 224, Rgb([255, 0, 128]));
        let data = PreprocessRecipe::VIT.apply(&image);
        let plane = 224 * 224;
        // ViT: (v - 0.5) / 0.5
        assert!((data[0] - 1.0).abs() < 1e-6);
        assert!((data[plane] + 1.0).abs() < 1e-6);
        assert!((data[2 * plane] - (128.0 / 255.0 - 0.5) / 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_recipes_normalise_differently() {
        let image = RgbImage::from_pixel(224, 224, Rgb([100, 100, 100]));
        let resnet = PreprocessRecipe::RESNET.apply(&image);
        let vit = PreprocessRecipe::VIT.apply(&image);

        assert_ne!(resnet[0], vit[0]);
        let expected = (100.0 / 255.0 - 0.485) / 0.229;
        assert!((resnet[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let image = RgbImage::from_fn(300, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
        let first = PreprocessRecipe::RESNET.apply(&image);
        let second = PreprocessRecipe::RESNET.apply(&image);
        assert_eq!(first, second);
    }
}
