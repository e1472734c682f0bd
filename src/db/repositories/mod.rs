mod nights;
