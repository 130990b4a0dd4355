//! Offset-addressed access to one flat memory store.
//!
//! Hosts that share a single linear memory with the engine (a WebAssembly
//! instance, for example) address every buffer as a byte offset into it.
//! [`Arena`] owns such a store and exposes the blur, channel, unsharp and
//! resample operations in that form. Every call resolves its offsets into
//! typed regions before touching memory, so a bad layout is reported without
//! writing anything.
//!
//! Regions a call writes must not overlap each other or anything the same
//! call reads. Read-only regions may overlap freely.

use bytemuck::Pod;

use crate::blur::blur_rows;
use crate::buffer::{Geometry, RGBA_BYTES};
use crate::channel::{extract, ColorModel};
use crate::error::{Error, Result};
use crate::gaussian::GaussianCoefficients;
use crate::kernel::FilterKernel;
use crate::resample::{horizontal_pass, intermediate_len, vertical_pass};
use crate::unsharp::UnsharpMask;

// ============================================================================
// Regions
// ============================================================================

/// Byte range of one buffer. Only built by [`Arena::span`], which checks
/// alignment and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    fn end(&self) -> usize {
        self.offset + self.len
    }

    fn overlaps(&self, other: &Span) -> bool {
        self.len > 0 && other.len > 0 && self.offset < other.end() && other.offset < self.end()
    }
}

fn out_of_range(required: usize, actual: usize) -> Error {
    Error::BufferTooSmall {
        what: "arena",
        required,
        actual,
    }
}

/// Writes must be pairwise disjoint and disjoint from every read.
fn check_layout(writes: &[Span], reads: &[Span]) -> Result<()> {
    for (i, w) in writes.iter().enumerate() {
        if writes[i + 1..].iter().chain(reads).any(|o| w.overlaps(o)) {
            return Err(Error::Overlap);
        }
    }
    Ok(())
}

/// Mutable regions carved out of the store, plus the shared gaps between
/// them that read-only regions are served from.
struct Regions<'a, const W: usize> {
    writes: [&'a mut [u8]; W],
    /// Gap in front of each write, in offset order, with its start offset.
    gaps: [(usize, &'a [u8]); W],
    tail: (usize, &'a [u8]),
    total: usize,
}

impl<'a, const W: usize> Regions<'a, W> {
    fn read(&self, span: Span) -> Result<&'a [u8]> {
        if span.end() > self.total {
            return Err(out_of_range(span.end(), self.total));
        }
        for &(start, gap) in self.gaps.iter().chain(core::iter::once(&self.tail)) {
            if span.offset >= start && span.end() <= start + gap.len() {
                return Ok(&gap[span.offset - start..span.end() - start]);
            }
        }
        Err(Error::Overlap)
    }
}

fn carve<'a, const W: usize>(bytes: &'a mut [u8], writes: [Span; W]) -> Result<Regions<'a, W>> {
    check_layout(&writes, &[])?;
    let total = bytes.len();
    let mut order: [usize; W] = core::array::from_fn(|i| i);
    order.sort_unstable_by_key(|&i| writes[i].offset);

    let mut out: [&'a mut [u8]; W] = core::array::from_fn(|_| Default::default());
    let mut gaps: [(usize, &'a [u8]); W] = [(0, Default::default()); W];
    let mut rest: &'a mut [u8] = bytes;
    let mut pos = 0;
    for (k, &i) in order.iter().enumerate() {
        let span = writes[i];
        if span.end() > total {
            return Err(out_of_range(span.end(), total));
        }
        if span.offset < pos {
            return Err(Error::Overlap);
        }
        let (gap, tail) = core::mem::take(&mut rest).split_at_mut(span.offset - pos);
        let (region, tail) = tail.split_at_mut(span.len);
        let gap: &'a [u8] = gap;
        gaps[k] = (pos, gap);
        out[i] = region;
        rest = tail;
        pos = span.end();
    }
    let rest: &'a [u8] = rest;
    Ok(Regions {
        writes: out,
        gaps,
        tail: (pos, rest),
        total,
    })
}

fn cast<T: Pod>(bytes: &[u8], offset: usize) -> Result<&[T]> {
    bytemuck::try_cast_slice(bytes).map_err(|_| Error::Misaligned {
        offset,
        align: core::mem::align_of::<T>(),
    })
}

fn cast_mut<T: Pod>(bytes: &mut [u8], offset: usize) -> Result<&mut [T]> {
    bytemuck::try_cast_slice_mut(bytes).map_err(|_| Error::Misaligned {
        offset,
        align: core::mem::align_of::<T>(),
    })
}

// ============================================================================
// Arena
// ============================================================================

/// A flat, byte-addressed store. Backed by `u32` words so that any offset
/// aligned for `u16`, `i16` or `f32` is aligned in memory too.
#[derive(Debug, Default, Clone)]
pub struct Arena {
    words: Vec<u32>,
}

impl Arena {
    /// A zeroed store of at least `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            words: vec![0; bytes.saturating_add(3) / 4],
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.words.len() * 4
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Extend the store to at least `bytes` bytes. Existing contents are kept
    /// and new bytes are zero.
    pub fn grow(&mut self, bytes: usize) {
        let words = bytes.saturating_add(3) / 4;
        if words > self.words.len() {
            log::trace!("arena: growing from {} to {} bytes", self.len(), words * 4);
            self.words.resize(words, 0);
        }
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    /// Copy `data` into the store at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let span = self.span::<u8>(offset, data.len())?;
        self.bytes_mut()[span.offset..span.end()].copy_from_slice(data);
        Ok(())
    }

    /// `len` bytes starting at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let span = self.span::<u8>(offset, len)?;
        Ok(&self.bytes()[span.offset..span.end()])
    }

    fn span<T: Pod>(&self, offset: usize, count: usize) -> Result<Span> {
        let align = core::mem::align_of::<T>();
        if offset % align != 0 {
            return Err(Error::Misaligned { offset, align });
        }
        let end = count
            .checked_mul(core::mem::size_of::<T>())
            .and_then(|len| len.checked_add(offset))
            .ok_or_else(|| out_of_range(usize::MAX, self.len()))?;
        if end > self.len() {
            return Err(out_of_range(end, self.len()));
        }
        Ok(Span {
            offset,
            len: end - offset,
        })
    }

    fn view(&self, span: Span) -> &[u8] {
        &self.bytes()[span.offset..span.end()]
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Blur the `u16` plane at `src_off` into `out_off`.
    ///
    /// `tmp_off` holds a `u16` plane of the same size and `line_off`
    /// `max(width, height)` floats. When a blur happens, the eight `f32`
    /// coefficients (see [`GaussianCoefficients::to_array`]) are written at
    /// `coefs_off`. `src_off` may equal `out_off`.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()> {
        let g = Geometry::new(width, height)?;
        let (w, h) = (g.width(), g.height());
        let src = self.span::<u16>(src_off, g.pixels())?;
        let out = self.span::<u16>(out_off, g.pixels())?;
        let tmp = self.span::<u16>(tmp_off, g.pixels())?;
        let line = self.span::<f32>(line_off, w.max(h))?;
        let coefs = self.span::<f32>(coefs_off, 8)?;
        check_layout(&[tmp, line, out, coefs], &[])?;
        check_layout(&[tmp, line, coefs], &[src])?;
        log::debug!("arena blur_mono16: {width}x{height}, radius {radius}, src {src_off}, out {out_off}");

        let Some(c) = GaussianCoefficients::for_blur(radius) else {
            log::trace!("arena blur_mono16: radius {radius} is a no-op");
            return Ok(());
        };

        {
            let r = carve(self.bytes_mut(), [coefs])?;
            let [dst] = r.writes;
            cast_mut::<f32>(dst, coefs_off)?.copy_from_slice(&c.to_array());
        }
        {
            let r = carve(self.bytes_mut(), [tmp, line])?;
            let plane = cast::<u16>(r.read(src)?, src_off)?;
            let [t, l] = r.writes;
            blur_rows(plane, cast_mut(t, tmp_off)?, cast_mut(l, line_off)?, &c, w, h);
        }
        let r = carve(self.bytes_mut(), [out, line])?;
        let transposed = cast::<u16>(r.read(tmp)?, tmp_off)?;
        let [o, l] = r.writes;
        blur_rows(transposed, cast_mut(o, out_off)?, cast_mut(l, line_off)?, &c, h, w);
        Ok(())
    }

    fn extract_channel(
        &mut self,
        model: ColorModel,
        src_off: usize,
        dst_off: usize,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let g = Geometry::new(width, height)?;
        let src = self.span::<u8>(src_off, g.pixels() * RGBA_BYTES)?;
        let dst = self.span::<u16>(dst_off, g.pixels())?;
        let r = carve(self.bytes_mut(), [dst])?;
        let rgba = r.read(src)?;
        let [d] = r.writes;
        extract(model, rgba, cast_mut(d, dst_off)?, width, height)
    }

    /// HSL lightness of the RGBA image at `src_off` into the plane at `dst_off`.
    pub fn hsl_l16(&mut self, src_off: usize, dst_off: usize, width: u32, height: u32) -> Result<()> {
        self.extract_channel(ColorModel::Hsl, src_off, dst_off, width, height)
    }

    /// HSV value of the RGBA image at `src_off` into the plane at `dst_off`.
    pub fn hsv_v16(&mut self, src_off: usize, dst_off: usize, width: u32, height: u32) -> Result<()> {
        self.extract_channel(ColorModel::Hsv, src_off, dst_off, width, height)
    }

    /// Unsharp-mask the RGBA image at `img_off` into `dst_off`, which may be
    /// the same offset. Returns the number of pixels rewritten.
    #[allow(clippy::too_many_arguments)]
    pub fn unsharp(
        &mut self,
        model: ColorModel,
        img_off: usize,
        dst_off: usize,
        plane_off: usize,
        blur_off: usize,
        width: u32,
        height: u32,
        amount: u32,
        threshold: u8,
    ) -> Result<usize> {
        let g = Geometry::new(width, height)?;
        let rgba_len = g.pixels() * RGBA_BYTES;
        let img = self.span::<u8>(img_off, rgba_len)?;
        let dst = self.span::<u8>(dst_off, rgba_len)?;
        let plane = self.span::<u16>(plane_off, g.pixels())?;
        let blurred = self.span::<u16>(blur_off, g.pixels())?;
        let mask = UnsharpMask::new(model, amount, threshold);

        if img_off == dst_off {
            let r = carve(self.bytes_mut(), [img])?;
            let p = cast::<u16>(r.read(plane)?, plane_off)?;
            let b = cast::<u16>(r.read(blurred)?, blur_off)?;
            let [i] = r.writes;
            mask.apply_in_place(i, p, b, width, height)
        } else {
            let r = carve(self.bytes_mut(), [dst])?;
            let src = r.read(img)?;
            let p = cast::<u16>(r.read(plane)?, plane_off)?;
            let b = cast::<u16>(r.read(blurred)?, blur_off)?;
            let [d] = r.writes;
            mask.apply_into(src, d, p, b, width, height)
        }
    }

    /// Resize the RGBA image at `src_off`, writing the result over the same
    /// offset.
    ///
    /// The kernels are `filters_x_len` and `filters_y_len` `i16` values long.
    /// `tmp_off` holds [`intermediate_len`] `u16` samples.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()> {
        let src_g = Geometry::new(src_w, src_h)?;
        let dst_g = Geometry::new(dst_w, dst_h)?;
        let src = self.span::<u8>(src_off, src_g.pixels() * RGBA_BYTES)?;
        let dst = self.span::<u8>(src_off, dst_g.pixels() * RGBA_BYTES)?;
        let fx = self.span::<i16>(filters_x_off, filters_x_len)?;
        let fy = self.span::<i16>(filters_y_off, filters_y_len)?;
        let tmp = self.span::<u16>(tmp_off, intermediate_len(src_h, dst_w))?;
        check_layout(&[tmp], &[src, fx, fy])?;
        check_layout(&[dst], &[tmp, fy])?;

        let (sw, sh, dw, dh) = (src_g.width(), src_g.height(), dst_g.width(), dst_g.height());
        FilterKernel::new(cast(self.view(fx), filters_x_off)?, sw, dw)?;
        FilterKernel::new(cast(self.view(fy), filters_y_off)?, sh, dh)?;
        log::debug!("arena convolve_hv: {src_w}x{src_h} -> {dst_w}x{dst_h}, alpha {has_alpha}");

        {
            let r = carve(self.bytes_mut(), [tmp])?;
            let pixels = r.read(src)?;
            let hk = FilterKernel::new(cast(r.read(fx)?, filters_x_off)?, sw, dw)?;
            let [t] = r.writes;
            horizontal_pass(pixels, cast_mut(t, tmp_off)?, sw, sh, &hk, has_alpha);
        }
        let r = carve(self.bytes_mut(), [dst])?;
        let transposed = cast::<u16>(r.read(tmp)?, tmp_off)?;
        let vk = FilterKernel::new(cast(r.read(fy)?, filters_y_off)?, sh, dh)?;
        let [d] = r.writes;
        vertical_pass(transposed, d, sh, dw, &vk, has_alpha);
        Ok(())
    }
}
