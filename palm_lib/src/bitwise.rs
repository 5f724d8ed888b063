/// Bit manipulation helpers for the serial shift registers
pub trait Bitwise: Copy {
    /// Returns true if the given bit is set in `self`
    fn bit(self, bitpos: u8) -> bool;

    /// Sets the given bit in self to 1 if `v` is true, 0 if `v` is false
    fn set_bit(&mut self, bitpos: u8, v: bool);

    /// Shifts `self` left by one and inserts `v` as the new LSB. The MSB is lost.
    fn shift_in(&mut self, v: bool);

    /// Returns the MSB of `self` then shifts `self` left by one, filling with 0.
    fn shift_out(&mut self) -> bool;
}

macro_rules! impl_bitwise {
    ($t:ty) => {
        impl Bitwise for $t {
            fn bit(self, bitpos: u8) -> bool {
                self & ((1 as $t) << bitpos) != 0
            }

            fn set_bit(&mut self, bitpos: u8, v: bool) {
                *self &= !((1 as $t) << bitpos);
                *self |= (v as $t) << bitpos;
            }

            fn shift_in(&mut self, v: bool) {
                *self = (*self << 1) | v as $t;
            }

            fn shift_out(&mut self) -> bool {
                let msb = self.bit(<$t>::BITS as u8 - 1);
                *self <<= 1;
                msb
            }
        }
    };
}

impl_bitwise!(u8);
impl_bitwise!(u16);

#[test]
fn bitwise() {
    let mut v = 0xaau8;

    assert!(v.bit(7));
    assert!(!v.bit(6));

    v.set_bit(6, true);
    assert_eq!(v, 0xea);

    v.set_bit(7, false);
    assert_eq!(v, 0x6a);

    v.shift_in(true);
    assert_eq!(v, 0xd5);

    assert!(v.shift_out());
    assert_eq!(v, 0xaa);
}

#[test]
fn shift_out_drains_msb_first() {
    let mut v = 0x8001u16;
    let mut bits = Vec::new();

    for _ in 0..16 {
        bits.push(v.shift_out());
    }

    assert!(bits[0]);
    assert!(bits[15]);
    assert_eq!(bits.iter().filter(|&&b| b).count(), 2);
    assert_eq!(v, 0);
}
