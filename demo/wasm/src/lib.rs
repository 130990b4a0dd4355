use wasm_bindgen::prelude::*;

use sharpscale::{Arena, ColorModel, ResampleScratch, Sharpener, UnsharpParams};

fn model(use_hsv: bool) -> ColorModel {
    if use_hsv {
        ColorModel::Hsv
    } else {
        ColorModel::Hsl
    }
}

/// Offset-addressed engine. The host lays out its buffers in the engine's
/// memory with `write`, runs the entry points, and reads results back.
#[wasm_bindgen]
pub struct Engine {
    arena: Arena,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: usize) -> Engine {
        Engine {
            arena: Arena::with_capacity(bytes),
        }
    }

    /// Extend memory to at least `bytes` bytes.
    pub fn grow(&mut self, bytes: usize) {
        self.arena.grow(bytes);
    }

    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// Copy of the whole memory.
    pub fn memory(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.arena.bytes())
    }

    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), JsError> {
        Ok(self.arena.write(offset, data)?)
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>, JsError> {
        Ok(self.arena.read(offset, len)?.to_vec())
    }

    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(js_name = blurMono16)]
    pub fn blur_mono16(
        &mut self,
        src_off: usize,
        out_off: usize,
        tmp_off: usize,
        line_off: usize,
        coefs_off: usize,
        width: u32,
        height: u32,
        radius: f32,
    ) -> Result<(), JsError> {
        Ok(self
            .arena
            .blur_mono16(src_off, out_off, tmp_off, line_off, coefs_off, width, height, radius)?)
    }

    #[wasm_bindgen(js_name = hslL16)]
    pub fn hsl_l16(&mut self, src_off: usize, dst_off: usize, width: u32, height: u32) -> Result<(), JsError> {
        Ok(self.arena.hsl_l16(src_off, dst_off, width, height)?)
    }

    #[wasm_bindgen(js_name = hsvV16)]
    pub fn hsv_v16(&mut self, src_off: usize, dst_off: usize, width: u32, height: u32) -> Result<(), JsError> {
        Ok(self.arena.hsv_v16(src_off, dst_off, width, height)?)
    }

    /// Returns the number of pixels rewritten.
    #[allow(clippy::too_many_arguments)]
    pub fn unsharp(
        &mut self,
        use_hsv: bool,
        img_off: usize,
        dst_off: usize,
        plane_off: usize,
        blur_off: usize,
        width: u32,
        height: u32,
        amount: u32,
        threshold: u8,
    ) -> Result<usize, JsError> {
        Ok(self.arena.unsharp(
            model(use_hsv),
            img_off,
            dst_off,
            plane_off,
            blur_off,
            width,
            height,
            amount,
            threshold,
        )?)
    }

    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(js_name = convolveHV)]
    pub fn convolve_hv(
        &mut self,
        src_off: usize,
        filters_x_off: usize,
        filters_x_len: usize,
        filters_y_off: usize,
        filters_y_len: usize,
        tmp_off: usize,
        src_w: u32,
        src_h: u32,
        dst_w: u32,
        dst_h: u32,
        has_alpha: bool,
    ) -> Result<(), JsError> {
        Ok(self.arena.convolve_hv(
            src_off,
            filters_x_off,
            filters_x_len,
            filters_y_off,
            filters_y_len,
            tmp_off,
            src_w,
            src_h,
            dst_w,
            dst_h,
            has_alpha,
        )?)
    }
}

/// Sharpen an RGBA buffer and return the result.
#[wasm_bindgen(js_name = unsharpMask)]
pub fn unsharp_mask(
    pixels: &[u8],
    width: u32,
    height: u32,
    amount: u32,
    radius: f32,
    threshold: u8,
    use_hsv: bool,
) -> Result<Vec<u8>, JsError> {
    let params = UnsharpParams::default()
        .with_amount(amount)
        .with_radius(radius)
        .with_threshold(threshold)
        .with_model(model(use_hsv));
    let mut out = pixels.to_vec();
    Sharpener::new().sharpen(&mut out, width, height, &params)?;
    Ok(out)
}

/// Resize an RGBA buffer with packed `i16` kernels and return the result.
#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn resize(
    pixels: &[u8],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    filters_x: &[i16],
    filters_y: &[i16],
    has_alpha: bool,
) -> Result<Vec<u8>, JsError> {
    let mut out = vec![0u8; dst_w as usize * dst_h as usize * 4];
    ResampleScratch::new().resample(
        pixels, &mut out, filters_x, filters_y, src_w, src_h, dst_w, dst_h, has_alpha,
    )?;
    Ok(out)
}

/// Get the library version string.
#[wasm_bindgen]
pub fn version() -> String {
    concat!("sharpscale ", env!("CARGO_PKG_VERSION")).to_string()
}
