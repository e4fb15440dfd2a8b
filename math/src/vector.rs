use num_traits::{Float, One, Zero};
use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

pub type Vec2d = Vec2<f64>;

pub trait Vector:
    Mul<<Self as Vector>::Scalar, Output = Self>
    + Div<<Self as Vector>::Scalar, Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Zero
    + Clone
    + PartialEq
    + PartialOrd
    + Index<usize, Output = <Self as Vector>::Scalar>
    + IndexMut<usize>
{
    type Scalar: Field;

    fn dot(&self, rhs: &Self) -> Self::Scalar;

    #[inline]
    fn squared_norm(&self) -> Self::Scalar {
        self.dot(self)
    }

    #[inline]
    fn norm(&self) -> Self::Scalar
    where
        Self::Scalar: Float,
    {
        self.squared_norm().sqrt()
    }

    #[inline]
    fn normalized(self) -> Self
    where
        Self::Scalar: Float,
    {
        let norm = self.norm();
        if norm == Self::Scalar::zero() {
            Self::zero()
        } else {
            self / norm
        }
    }
}

pub trait Field:
    Mul<Output = Self>
    + Div<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Zero
    + One
    + Copy
    + Clone
    + PartialEq
    + PartialOrd
{
}

impl<S> Field for S where
    S: Mul<Output = S>
        + Div<Output = S>
        + Add<Output = S>
        + Sub<Output = S>
        + Zero
        + One
        + Copy
        + PartialEq
        + PartialOrd
{
}

#[repr(C)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct Vec2<Scalar: Field>(pub [Scalar; 2]);

impl<Scalar: Field> Vec2<Scalar> {
    #[inline]
    pub fn new(x: Scalar, y: Scalar) -> Self {
        Vec2([x, y])
    }

    #[inline]
    pub fn cross(&self, rhs: &Self) -> Scalar {
        self[0] * rhs[1] - self[1] * rhs[0]
    }

    #[inline]
    pub fn normal(self) -> Vec2<Scalar>
    where
        Scalar: Neg<Output = Scalar>,
    {
        Vec2::new(-self[1], self[0])
    }
}

impl<Scalar: Field> Vector for Vec2<Scalar> {
    type Scalar = Scalar;

    #[inline]
    fn dot(&self, rhs: &Self) -> Scalar {
        self[0] * rhs[0] + self[1] * rhs[1]
    }
}

impl<Scalar: Field> Zero for Vec2<Scalar> {
    #[inline]
    fn zero() -> Self {
        Vec2::new(Scalar::zero(), Scalar::zero())
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self[0] == Scalar::zero() && self[1] == Scalar::zero()
    }
}

impl<Scalar: Field> Add for Vec2<Scalar> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec2::new(self[0] + rhs[0], self[1] + rhs[1])
    }
}

impl<Scalar: Field> Sub for Vec2<Scalar> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec2::new(self[0] - rhs[0], self[1] - rhs[1])
    }
}

impl<Scalar: Field + Neg<Output = Scalar>> Neg for Vec2<Scalar> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Vec2::new(-self[0], -self[1])
    }
}

impl<Scalar: Field> Mul<Scalar> for Vec2<Scalar> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Scalar) -> Self {
        Vec2::new(self[0] * rhs, self[1] * rhs)
    }
}

impl<Scalar: Field> Div<Scalar> for Vec2<Scalar> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Scalar) -> Self {
        Vec2::new(self[0] / rhs, self[1] / rhs)
    }
}

impl<Scalar: Field> Index<usize> for Vec2<Scalar> {
    type Output = Scalar;

    #[inline]
    fn index(&self, index: usize) -> &Scalar {
        &self.0[index]
    }
}

impl<Scalar: Field> IndexMut<usize> for Vec2<Scalar> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Scalar {
        &mut self.0[index]
    }
}
