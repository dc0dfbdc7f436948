//! Synthetic PE images for tests.
//!
//! The images are structurally valid enough for [`crate::inspect`] and for
//! signature sniffing, but contain no runnable code.

const PE_OFFSET: usize = 0x40;
const FILE_ALIGN: usize = 0x200;
const SECTION_ALIGN: u32 = 0x1000;

#[derive(Clone, Debug)]
pub struct PeBuilder {
    machine:   u16,
    pe32_plus: bool,
    subsystem: u16,
    dll:       bool,
    imports:   Vec<String>,
    sections:  Vec<String>,
    overlay:   Vec<u8>,
}

impl Default for PeBuilder {
    fn default() -> Self {
        Self::x64()
    }
}

impl PeBuilder {
    pub fn x64() -> Self {
        Self {
            machine:   0x8664,
            pe32_plus: true,
            subsystem: 2,
            dll:       false,
            imports:   Vec::new(),
            sections:  vec![".text".into()],
            overlay:   Vec::new(),
        }
    }

    pub fn x86() -> Self {
        Self {
            machine: 0x014c,
            pe32_plus: false,
            ..Self::x64()
        }
    }

    pub fn arm64() -> Self {
        Self {
            machine: 0xAA64,
            ..Self::x64()
        }
    }

    pub fn console(mut self) -> Self {
        self.subsystem = 3;
        self
    }

    pub fn dll(mut self) -> Self {
        self.dll = true;
        self
    }

    pub fn import(mut self, library: impl Into<String>) -> Self {
        self.imports.push(library.into());
        self
    }

    pub fn section(mut self, name: impl Into<String>) -> Self {
        self.sections.push(name.into());
        self
    }

    /// Bytes appended after the last section, where installers keep their payload.
    pub fn overlay(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.overlay.extend_from_slice(bytes.as_ref());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut names = self.sections.clone();
        if !self.imports.is_empty() {
            names.push(".idata".into());
        }

        let opt_size: usize = if self.pe32_plus { 112 + 128 } else { 96 + 128 };
        let headers_end = PE_OFFSET + 4 + 20 + opt_size + names.len() * 40;
        let headers_len = align(headers_end, FILE_ALIGN);

        let idata = self.import_section(SECTION_ALIGN * names.len() as u32);
        let mut image = vec![0u8; headers_len];

        image[..2].copy_from_slice(b"MZ");
        put_u32(&mut image, 0x3C, PE_OFFSET as u32);
        image[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

        let coff = PE_OFFSET + 4;
        put_u16(&mut image, coff, self.machine);
        put_u16(&mut image, coff + 2, names.len() as u16);
        put_u16(&mut image, coff + 16, opt_size as u16);
        let mut characteristics = 0x0002u16;
        if self.dll {
            characteristics |= 0x2000;
        }
        put_u16(&mut image, coff + 18, characteristics);

        let opt = coff + 20;
        put_u16(&mut image, opt, if self.pe32_plus { 0x20b } else { 0x10b });
        put_u16(&mut image, opt + 68, self.subsystem);
        put_u32(&mut image, opt + 32, SECTION_ALIGN);
        put_u32(&mut image, opt + 36, FILE_ALIGN as u32);
        put_u32(&mut image, opt + 56, SECTION_ALIGN * (names.len() as u32 + 1));
        put_u32(&mut image, opt + 60, headers_len as u32);
        let num_rva = opt + if self.pe32_plus { 108 } else { 92 };
        put_u32(&mut image, num_rva, 16);

        let table = opt + opt_size;
        let mut raw_addr = headers_len;
        let mut bodies = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let body = if name == ".idata" && !self.imports.is_empty() {
                idata.clone()
            } else {
                vec![0u8; FILE_ALIGN]
            };
            let raw_size = align(body.len(), FILE_ALIGN);
            let va = SECTION_ALIGN * (i as u32 + 1);

            let base = table + i * 40;
            let name_bytes = name.as_bytes();
            let n = name_bytes.len().min(8);
            image[base..base + n].copy_from_slice(&name_bytes[..n]);
            put_u32(&mut image, base + 8, body.len() as u32);
            put_u32(&mut image, base + 12, va);
            put_u32(&mut image, base + 16, raw_size as u32);
            put_u32(&mut image, base + 20, raw_addr as u32);

            if name == ".idata" && !self.imports.is_empty() {
                let import_dir = num_rva + 4 + 8;
                put_u32(&mut image, import_dir, va);
                put_u32(&mut image, import_dir + 4, ((self.imports.len() + 1) * 20) as u32);
            }

            let mut padded = body;
            padded.resize(raw_size, 0);
            bodies.push(padded);
            raw_addr += raw_size;
        }

        for body in bodies {
            image.extend_from_slice(&body);
        }
        image.extend_from_slice(&self.overlay);
        image
    }

    /// Import descriptors, one shared thunk list importing ordinal 1, then the
    /// library names.
    fn import_section(&self, va: u32) -> Vec<u8> {
        let descriptors = (self.imports.len() + 1) * 20;
        let thunk = descriptors;
        let mut names_at = thunk + 16;
        let mut body = vec![0u8; names_at];
        if self.pe32_plus {
            body[thunk..thunk + 8].copy_from_slice(&(1u64 << 63 | 1).to_le_bytes());
        } else {
            body[thunk..thunk + 4].copy_from_slice(&(1u32 << 31 | 1).to_le_bytes());
        }
        for (i, library) in self.imports.iter().enumerate() {
            let base = i * 20;
            put_u32(&mut body, base, va + thunk as u32);
            put_u32(&mut body, base + 12, va + names_at as u32);
            put_u32(&mut body, base + 16, va + thunk as u32);
            body.extend_from_slice(library.as_bytes());
            body.push(0);
            names_at = body.len();
        }
        body
    }
}

fn align(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

fn put_u16(buf: &mut [u8], off: usize, value: u16) {
    buf[off..off + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}
