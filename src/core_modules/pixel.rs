// THEORY:
// The `Pixel` module is the smallest unit of the engine: a "dumb" RGBA color value.
// It knows how to build itself from raw bytes and how to turn itself back into bytes.
// It does not know how to compare itself to other pixels; that belongs to the scorer.
//
// The same type serves as a canvas sample, a palette entry and a mutation's fill
// color. It is `Copy` and `Hash` so the palette can key a set on exact color values.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 4;

    /// A single RGBA color.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub const WHITE: Pixel = Pixel::new(255, 255, 255, 255);
        pub const BLACK: Pixel = Pixel::new(0, 0, 0, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Same color with the alpha channel forced to fully opaque.
        pub const fn opaque(self) -> Self {
            Pixel::new(self.red, self.green, self.blue, 255)
        }

        pub fn to_bytes(self) -> [Byte; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            pixel.to_bytes().to_vec()
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::new(red, green, blue, alpha)
        }
    }

    impl From<Pixel> for image::Rgba<u8> {
        fn from(pixel: Pixel) -> Self {
            image::Rgba(pixel.to_bytes())
        }
    }
}
